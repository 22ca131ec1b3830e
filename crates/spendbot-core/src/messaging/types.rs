#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    /// Build a one-button-per-row keyboard from `(label, callback_data)` pairs.
    pub fn one_per_row(options: &[(&str, &str)]) -> Self {
        let buttons = options
            .iter()
            .map(|(label, data)| InlineButton {
                label: (*label).to_string(),
                callback_data: (*data).to_string(),
            })
            .collect();
        Self { buttons }
    }
}

/// Limits of the messenger behind a `MessagingPort`.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
}
