//! Core traits for the care agent
//!
//! The conversation policies never touch the media layer directly. They talk
//! to a [`VoiceChannel`], which the hosting runtime implements (a telephony
//! bridge socket in production, a recording fake in tests).

mod voice;

pub use voice::{RecognizerBackend, VoiceChannel};
