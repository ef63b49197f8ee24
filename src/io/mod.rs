pub mod playback;
pub mod wav;

pub use playback::play_through;
pub use wav::{read_wav, write_wav, WavData, WavError};
