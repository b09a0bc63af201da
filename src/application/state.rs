//! # Session State
//!
//! The pending-action store and the conversation history of one session.
//! Both are owned by the session; neither is shared across tasks.

use crate::domain::types::{AgentAction, Message, MessageRole};

/// Actions extracted from the latest response, waiting for explicit execution.
/// Holds at most one batch; a new response replaces it wholesale.
#[derive(Debug, Default, Clone)]
pub struct PendingActions {
    actions: Vec<AgentAction>,
}

impl PendingActions {
    /// Replaces the stored batch. An empty batch clears the store.
    ///
    /// `Session::send_message` only calls this with a non-empty batch, so a
    /// reply without actions keeps the previous batch pending.
    pub fn replace(&mut self, actions: Vec<AgentAction>) {
        self.actions = actions;
    }

    /// Removes and returns the stored batch.
    pub fn take(&mut self) -> Vec<AgentAction> {
        std::mem::take(&mut self.actions)
    }

    pub fn actions(&self) -> &[AgentAction] {
        &self.actions
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

/// Ordered chat history. The system prompt is kept outside of it.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Flattens the history into a single prompt: `Role: content` blocks
    /// separated by a blank line, led by the system prompt when one is set.
    pub fn flatten(&self, system: Option<&str>) -> String {
        let system = system
            .filter(|s| !s.is_empty())
            .map(|s| format!("{}: {s}", MessageRole::System.label()));
        system
            .into_iter()
            .chain(
                self.messages
                    .iter()
                    .map(|m| format!("{}: {}", m.role.label(), m.content)),
            )
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &str) -> AgentAction {
        AgentAction::ReadFile { path: path.into() }
    }

    #[test]
    fn test_replace_and_take() {
        let mut pending = PendingActions::default();
        assert!(pending.is_empty());

        pending.replace(vec![read("a"), read("b")]);
        assert_eq!(pending.len(), 2);

        pending.replace(vec![read("c")]);
        assert_eq!(pending.actions(), &[read("c")]);

        assert_eq!(pending.take(), vec![read("c")]);
        assert!(pending.is_empty());
        assert!(pending.take().is_empty());
    }

    #[test]
    fn test_replace_with_empty_clears() {
        let mut pending = PendingActions::default();
        pending.replace(vec![read("a")]);
        pending.replace(Vec::new());
        assert!(pending.is_empty());

        pending.replace(vec![read("a")]);
        pending.clear();
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn test_flatten_history() {
        let mut conversation = Conversation::default();
        assert_eq!(conversation.flatten(None), "");

        conversation.push(Message::user("make a file"));
        conversation.push(Message::assistant("<create_file>...</create_file>"));
        conversation.push(Message::user("thanks"));

        assert_eq!(
            conversation.flatten(None),
            "User: make a file\n\nAssistant: <create_file>...</create_file>\n\nUser: thanks"
        );
    }

    #[test]
    fn test_flatten_leads_with_system_prompt() {
        let mut conversation = Conversation::default();
        conversation.push(Message::user("hi"));

        assert_eq!(
            conversation.flatten(Some("Be terse.")),
            "System: Be terse.\n\nUser: hi"
        );
        assert_eq!(conversation.flatten(Some("")), "User: hi");
    }
}
