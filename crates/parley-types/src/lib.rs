pub mod codec;
pub mod events;
pub mod models;

pub use codec::{
    decode_stream, encode_frame, encode_frame_bytes, CodecError, FrameDecoder,
    EVENT_STREAM_CONTENT_TYPE, FRAME_PREFIX,
};
pub use events::ChatEvent;
pub use models::{
    derive_title, Message, MessageRole, NewMessage, NewSession, NewUser, Session, SessionUpdate,
    SessionWithMessages, User, ValidationError, TITLE_MAX_CHARS,
};
