pub mod llm;
pub mod nl2bash;
pub mod nlu;
pub mod shell;
