use serde::{Deserialize, Serialize};

pub type MessageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
    System,
}

impl Sender {
    pub fn label(self) -> Option<&'static str> {
        match self {
            Sender::User => Some("You"),
            Sender::Assistant => Some("Assistant"),
            Sender::System => None,
        }
    }
}

/// One transcript entry. `rendered_len` counts characters of `text` that are
/// visible; it only grows and never passes `text`'s character count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    rendered_len: usize,
}

impl Message {
    pub fn revealed(id: MessageId, sender: Sender, text: impl Into<String>) -> Self {
        let text = text.into();
        let rendered_len = text.chars().count();
        Self { id, sender, text, rendered_len }
    }

    pub fn hidden(id: MessageId, sender: Sender, text: impl Into<String>) -> Self {
        Self { id, sender, text: text.into(), rendered_len: 0 }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    #[cfg(test)]
    pub fn rendered_len(&self) -> usize {
        self.rendered_len
    }

    /// Raises the revealed count to `n`, clamped to the text length.
    /// Smaller values are ignored.
    pub fn reveal_to(&mut self, n: usize) {
        let n = n.min(self.char_len());
        if n > self.rendered_len {
            self.rendered_len = n;
        }
    }

    pub fn is_fully_rendered(&self) -> bool {
        self.rendered_len == self.char_len()
    }

    pub fn visible_text(&self) -> &str {
        match self.text.char_indices().nth(self.rendered_len) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }

    pub fn display_line(&self) -> String {
        match self.sender.label() {
            Some(label) => format!("{}: {}", label, self.visible_text()),
            None => self.visible_text().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// Only the latest user text is sent; earlier turns are not included.
    pub fn single_turn(model: &str, text: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage { role: "user".into(), content: text.to_string() }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

impl CompletionResponse {
    pub fn into_reply(self) -> Option<String> {
        self.choices.into_iter().next().map(|c| c.message.content)
    }
}
