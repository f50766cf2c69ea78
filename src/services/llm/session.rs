use std::collections::VecDeque;

const PERSONA: &str = "Eres Neo, un asistente de voz útil y con algo de sorna. \
Responde de forma breve y directa, en español. Si no sabes algo, admítelo.";

/// Turns kept in the prompt.
pub const HISTORY_TURNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

/// Rolling conversation used to build chat prompts.
#[derive(Debug, Clone)]
pub struct ChatSession {
    persona: String,
    history: VecDeque<Turn>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(PERSONA)
    }
}

impl ChatSession {
    pub fn new(persona: &str) -> Self {
        Self { persona: persona.to_string(), history: VecDeque::with_capacity(HISTORY_TURNS + 1) }
    }

    pub fn history(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn record(&mut self, user: &str, assistant: &str) {
        if self.history.len() == HISTORY_TURNS {
            self.history.pop_front();
        }
        self.history.push_back(Turn { user: user.to_string(), assistant: assistant.to_string() });
    }

    /// Persona, optional grounding, recent turns, then the new input.
    pub fn prompt(&self, user_input: &str, context: Option<&str>) -> String {
        let mut prompt = format!("<|system|>\n{}\n", self.persona);
        if let Some(context) = context {
            prompt.push_str(&format!("CONTEXTO DEL SISTEMA: {}\n", context));
        }
        prompt.push_str("<|end_of_text|>\n");

        for turn in &self.history {
            prompt.push_str(&format!("<|user|>\n{}<|end_of_text|>\n", turn.user));
            prompt.push_str(&format!("<|assistant|>\n{}<|end_of_text|>\n", turn.assistant));
        }
        prompt.push_str(&format!("<|user|>\n{}<|end_of_text|>\n<|assistant|>\n", user_input));
        prompt
    }
}
