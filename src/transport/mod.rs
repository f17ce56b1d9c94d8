//! Transport layer: wire-format details (serialization/deserialization).

mod create_message;

pub use create_message::{
    ApiErrorBody, MessageResource, TransportError, decode_error_json_response,
    decode_message_json_response, encode_create_message_form,
};
