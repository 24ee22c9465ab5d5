//! Outbound command construction.

use serde::Serialize;
use serde_json::Value;

use crate::error::ProxyError;
use crate::types::{ClientOptions, Message};

/// Key under which Browse places the requested attribute list.
pub const RETURN_ATTRIBUTES_KEY: &str = "ReturnAttributes";

/// Command names understood by the installation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandName {
    Browse,
    Install,
    Upgrade,
    Uninstall,
}

impl CommandName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Browse => "Browse",
            Self::Install => "Install",
            Self::Upgrade => "Upgrade",
            Self::Uninstall => "Uninstall",
        }
    }
}

/// A single request to the installation service. Built fresh for every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Command {
    command: CommandName,
    #[serde(skip_serializing_if = "Option::is_none")]
    application_identifier: Option<String>,
    client_options: ClientOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_path: Option<String>,
}

impl Command {
    /// Browse installed applications. `attributes` are merged into the
    /// client options as `ReturnAttributes`.
    pub fn browse(mut options: ClientOptions, attributes: Option<Vec<String>>) -> Self {
        if let Some(attributes) = attributes {
            let list = attributes.into_iter().map(Value::String).collect::<Vec<_>>();
            options.insert(RETURN_ATTRIBUTES_KEY, Value::Array(list));
        }
        Self {
            command: CommandName::Browse,
            application_identifier: None,
            client_options: options,
            package_path: None,
        }
    }

    /// Install or upgrade from an archive already staged on the device.
    pub fn package(name: CommandName, options: ClientOptions, package_path: &str) -> Self {
        Self {
            command: name,
            application_identifier: None,
            client_options: options,
            package_path: Some(package_path.to_string()),
        }
    }

    pub fn uninstall(bundle_identifier: &str, options: ClientOptions) -> Self {
        Self {
            command: CommandName::Uninstall,
            application_identifier: Some(bundle_identifier.to_string()),
            client_options: options,
            package_path: None,
        }
    }

    pub fn name(&self) -> CommandName {
        self.command
    }

    pub fn client_options(&self) -> &ClientOptions {
        &self.client_options
    }

    pub fn package_path(&self) -> Option<&str> {
        self.package_path.as_deref()
    }

    pub fn application_identifier(&self) -> Option<&str> {
        self.application_identifier.as_deref()
    }

    /// Encode into the structured message sent over the channel.
    pub fn into_message(self) -> Result<Message, ProxyError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(ProxyError::Encode(serde::ser::Error::custom(format!(
                "command encoded to a non-object value: {other}"
            )))),
        }
    }
}
