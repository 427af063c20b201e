use super::types::Message;

/// Ordered conversation for one session
///
/// Insertion order is display order. Once appended, a message is never
/// removed, edited or moved; the only bulk operation is seeding from the
/// remote history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the whole conversation with a fetched history.
    ///
    /// Empty histories are ignored so an unknown session keeps whatever is
    /// shown locally. Returns whether the transcript was replaced.
    pub fn seed(&mut self, history: Vec<Message>) -> bool {
        if history.is_empty() {
            return false;
        }
        self.messages = history;
        true
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
