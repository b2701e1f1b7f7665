// The parameters that describe the target database, the identity of the
// client, and the credentials.

pub(crate) mod client_identity;
pub(crate) mod connect_params;
pub(crate) mod connect_params_builder;
