//! # Help Text
//!
//! REPL banner and command reference, shown at startup and by `/help`.

pub const BANNER: &str = concat!(
    "╔════════════════════════════════════════════════════════════╗\n",
    "║              toolsmith - coding agent for Ollama           ║\n",
    "╚════════════════════════════════════════════════════════════╝"
);

pub const COMMANDS: &str = concat!(
    "Commands:\n",
    "  /help            Show this help message\n",
    "  /clear           Clear conversation history\n",
    "  /model [name]    Show or switch the model\n",
    "  /system [text]   Show or set the system prompt (a prompt name also works)\n",
    "  /prompt [name]   List or load a saved system prompt\n",
    "  /workdir [dir]   Show or set the working directory for actions\n",
    "  /auto [on|off]   Show or toggle auto-execution of actions\n",
    "  /pending         List actions waiting for /execute\n",
    "  /execute         Run the pending actions\n",
    "  /exit, /quit     Leave the REPL\n",
    "\n",
    "Ctrl+C stops the current response or command."
);

pub const INTRO: &str = "Type your message and press Enter to chat.";
