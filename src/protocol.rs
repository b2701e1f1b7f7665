mod field_type_context;
mod message_type;
mod part;
mod part_attributes;
mod partkind;
pub mod parts;

// There is no usecase for multiple segments in one request, so message and
// segment are modelled together. Request messages and reply messages are
// modelled separately since their payloads do not overlap.
mod reply;
mod reply_type;
mod request;

mod server_usage;
pub(crate) mod util;
pub(crate) mod util_sync;

pub(crate) use self::{
    field_type_context::FieldTypeContext, message_type::MessageType, part::Part,
    part_attributes::PartAttributes, partkind::PartKind, reply::Reply, reply_type::ReplyType,
    request::Request,
};

pub use self::server_usage::ServerUsage;
