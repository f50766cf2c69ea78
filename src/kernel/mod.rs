pub mod actions;
pub mod dialogue;
pub mod dispatcher;
pub mod event;
pub mod intent;
pub mod presence;
pub mod reactor;
pub mod router;
pub mod scheduler;
pub mod speech;
pub mod state;
pub mod synth;
pub mod telemetry;
pub mod time;
