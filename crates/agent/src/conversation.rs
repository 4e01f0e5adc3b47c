use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Question/answer pairs kept for follow-up questions, oldest evicted first.
#[derive(Clone, Debug, Default)]
pub struct ConversationHistory {
    max_turns: usize,
    turns: VecDeque<(ChatMessage, ChatMessage)>,
}

impl ConversationHistory {
    pub fn new(max_turns: usize) -> Self {
        Self { max_turns, turns: VecDeque::with_capacity(max_turns) }
    }

    pub fn record(&mut self, query: &str, answer: &str) {
        if self.max_turns == 0 {
            return;
        }
        while self.turns.len() >= self.max_turns {
            self.turns.pop_front();
        }
        self.turns.push_back((ChatMessage::user(query), ChatMessage::assistant(answer)));
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .flat_map(|(question, answer)| [question.clone(), answer.clone()])
            .collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, ConversationHistory, Role};

    #[test]
    fn history_evicts_oldest_turns() {
        let mut history = ConversationHistory::new(2);
        history.record("q1", "a1");
        history.record("q2", "a2");
        history.record("q3", "a3");

        assert_eq!(history.len(), 2);
        assert_eq!(
            history.messages(),
            vec![
                ChatMessage::user("q2"),
                ChatMessage::assistant("a2"),
                ChatMessage::user("q3"),
                ChatMessage::assistant("a3"),
            ]
        );
    }

    #[test]
    fn zero_capacity_history_records_nothing() {
        let mut history = ConversationHistory::new(0);
        history.record("q1", "a1");

        assert!(history.is_empty());
    }

    #[test]
    fn clear_forgets_everything() {
        let mut history = ConversationHistory::new(3);
        history.record("q1", "a1");
        history.clear();

        assert!(history.messages().is_empty());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::system("be brief")).expect("serialize");
        assert_eq!(json, r#"{"role":"system","content":"be brief"}"#);
        assert_eq!(ChatMessage::assistant("x").role, Role::Assistant);
    }
}
