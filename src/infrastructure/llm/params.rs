//! Model parameter parsing for the `parameters` text returned by `/api/show`.

/// The handful of parameters worth showing to the user.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModelParameters {
    pub context_length: Option<u64>,
    pub embedding_length: Option<u64>,
    pub gpu_layers: Option<u64>,
    pub template: Option<String>,
}

impl ModelParameters {
    /// Reads `key: value` or `key value` lines. Unknown keys and malformed
    /// numbers are ignored.
    pub fn parse(text: &str) -> Self {
        let mut params = Self::default();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((key, value)) = split_pair(line) else {
                continue;
            };
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');

            match key {
                "context_length" | "num_ctx" => params.context_length = value.parse().ok(),
                "embedding_length" => params.embedding_length = value.parse().ok(),
                "gpu_layers" | "num_gpu" => params.gpu_layers = value.parse().ok(),
                "template" => {
                    let template = value.trim_start_matches('|').trim();
                    params.template = (!template.is_empty()).then(|| template.to_string());
                }
                _ => {}
            }
        }

        params
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn split_pair(line: &str) -> Option<(&str, &str)> {
    if let Some((key, value)) = line.split_once(':') {
        let key = key.trim();
        if !key.contains(char::is_whitespace) {
            return Some((key, value));
        }
    }
    line.split_once(char::is_whitespace)
        .map(|(key, value)| (key.trim(), value))
}
