//! Group command implementation.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::cli::GroupCommands;
use crate::client::ApiClient;
use crate::error::CliError;
use crate::format;
use crate::output::{Message, OutputFormat, Table, TableDisplay};
use crate::resources::{Group, decode, decode_list};

use super::confirmed;

/// Body of `POST /access/groups`.
#[derive(Debug, Serialize)]
struct CreateGroup<'a> {
    groupid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

/// Body of `PUT /access/groups/{groupid}`.
#[derive(Debug, Serialize)]
struct ModifyGroup<'a> {
    comment: &'a str,
}

/// Group command executor.
pub struct GroupCommand<'a> {
    client: &'a ApiClient,
}

impl<'a> GroupCommand<'a> {
    /// Create a new group command.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Execute a group subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails, the response cannot be decoded,
    /// or `modify` is given nothing to change.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &GroupCommands,
    ) -> Result<(), CliError> {
        match command {
            GroupCommands::List => self.list(writer, format).await,
            GroupCommands::Show { groupid } => self.show(writer, format, groupid).await,
            GroupCommands::Create { groupid, comment } => {
                let body = CreateGroup { groupid, comment: comment.as_deref() };
                let _: Value = self.client.post("/access/groups", Some(&body)).await?;
                format.write(writer, &Message::success(format!("Group '{groupid}' created")))
            }
            GroupCommands::Modify { groupid, comment } => {
                let Some(comment) = comment else {
                    return Err(CliError::InvalidArgument(
                        "no changes specified (use --comment)".into(),
                    ));
                };
                let body = ModifyGroup { comment };
                let _: Value = self
                    .client
                    .put(&format!("/access/groups/{groupid}"), Some(&body))
                    .await?;
                format.write(writer, &Message::success(format!("Group '{groupid}' updated")))
            }
            GroupCommands::Delete { groupid, force } => {
                let question = format!("Are you sure you want to delete group '{groupid}'?");
                if !confirmed(*force, &question)? {
                    return format.write(writer, &Message::aborted("Aborted."));
                }
                self.client.delete(&format!("/access/groups/{groupid}")).await?;
                format.write(writer, &Message::success(format!("Group '{groupid}' deleted")))
            }
        }
    }

    async fn list<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let data: Value = self.client.get("/access/groups").await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let groups: Vec<Group> = decode_list(data)?;
        let mut table = Table::new(&["GROUP ID", "COMMENT", "MEMBERS"]);
        for group in &groups {
            table.row([group.groupid.clone(), group.comment.clone(), group.users.join(",")]);
        }
        table.write_table(writer)
    }

    async fn show<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        groupid: &str,
    ) -> Result<(), CliError> {
        let data: Value = self.client.get(&format!("/access/groups/{groupid}")).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let group = decode::<Option<BTreeMap<String, Value>>>(data)?.unwrap_or_default();
        let mut table = Table::fields();
        for (key, value) in &group {
            table.field(key, field_value(value));
        }
        table.write_table(writer)
    }
}

/// Member lists render comma-joined; everything else as-is.
fn field_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(format::stringify).collect::<Vec<_>>().join(","),
        other => format::stringify(other),
    }
}
