use crate::{
    protocol::parts::hdb_value::{emit_length_and_string, string_length},
    HdbResult,
};
use std::collections::HashMap;

// Key/value pairs describing the client; sent with the first request after
// authentication and re-sent whenever an entry changes.
//
// Next to the fixed driver entries this also transports the configured
// session variables, which the server exposes via SESSION_CONTEXT().
#[derive(Clone, Debug)]
pub(crate) struct ClientInfo(HashMap<String, String>);

impl Default for ClientInfo {
    fn default() -> Self {
        let mut ci = Self(HashMap::new());
        if let Some(os_str) = std::env::args_os().next() {
            let p = std::path::Path::new(&os_str);
            if let Some(s) = p.file_name() {
                ci.set_application(s.to_string_lossy());
            }
        }
        ci.set("DRIVER", "hdbclient");
        ci.set("DRIVERVERSION", env!("CARGO_PKG_VERSION"));
        ci
    }
}

impl std::fmt::Display for ClientInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        for (k, v) in &self.0 {
            writeln!(f, "{k} = {v}")?;
        }
        Ok(())
    }
}

impl ClientInfo {
    pub fn set_application<S: AsRef<str>>(&mut self, application: S) {
        self.set("APPLICATION", application.as_ref());
    }
    pub fn set_application_version(&mut self, application_version: &str) {
        self.set("APPLICATIONVERSION", application_version);
    }
    pub fn set_application_source(&mut self, application_source: &str) {
        self.set("APPLICATIONSOURCE", application_source);
    }
    pub fn set_application_user(&mut self, application_user: &str) {
        self.set("APPLICATIONUSER", application_user);
    }
    pub fn set_session_variable(&mut self, key: &str, value: &str) {
        self.set(key, value);
    }

    pub fn emit(&self, w: &mut dyn std::io::Write) -> HdbResult<()> {
        for (key, value) in &self.0 {
            emit_length_and_string(key, w)?;
            emit_length_and_string(value, w)?;
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        let mut len = 0;
        for (key, value) in &self.0 {
            len += string_length(key) + string_length(value);
        }
        len
    }
    pub fn count(&self) -> usize {
        self.0.len() * 2
    }

    fn set(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }
}
