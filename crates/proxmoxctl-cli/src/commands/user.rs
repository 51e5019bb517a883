//! User command implementation.
//!
//! Accounts live under `/access/users`. User IDs always take the form
//! `USER@REALM`, e.g. `alice@pam` or `bob@pve`.

use std::io::Write;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::cli::{UserCommands, UserCreateArgs, UserModifyArgs};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::format;
use crate::output::{Message, OutputFormat, Table, TableDisplay};
use crate::prompt;
use crate::resources::{User, decode, decode_list};

use super::confirmed;

/// Body of `POST /access/users`.
#[derive(Debug, Serialize)]
struct CreateUser<'a> {
    userid: &'a str,
    enable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    firstname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lastname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire: Option<i64>,
}

impl<'a> CreateUser<'a> {
    fn from_args(args: &'a UserCreateArgs) -> Result<Self, CliError> {
        if !args.userid.contains('@') {
            return Err(CliError::InvalidArgument(
                "userid must be in USER@REALM format (e.g. alice@pam)".into(),
            ));
        }
        Ok(Self {
            userid: &args.userid,
            enable: args.enabled,
            password: args.password.as_deref(),
            firstname: args.firstname.as_deref(),
            lastname: args.lastname.as_deref(),
            email: args.email.as_deref(),
            comment: args.comment.as_deref(),
            groups: args.groups.as_deref(),
            expire: (args.expire > 0).then_some(args.expire),
        })
    }
}

/// Body of `PUT /access/users/{userid}`.
#[derive(Debug, Serialize)]
struct ModifyUser<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    firstname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lastname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable: Option<bool>,
}

impl<'a> ModifyUser<'a> {
    fn from_args(args: &'a UserModifyArgs) -> Result<Self, CliError> {
        let changes = Self {
            firstname: args.firstname.as_deref(),
            lastname: args.lastname.as_deref(),
            email: args.email.as_deref(),
            comment: args.comment.as_deref(),
            groups: args.groups.as_deref(),
            expire: args.expire.filter(|secs| *secs >= 0),
            enable: args.enabled,
        };
        let unchanged = changes.firstname.is_none()
            && changes.lastname.is_none()
            && changes.email.is_none()
            && changes.comment.is_none()
            && changes.groups.is_none()
            && changes.expire.is_none()
            && changes.enable.is_none();
        if unchanged {
            return Err(CliError::InvalidArgument(
                "no changes specified (use --firstname, --lastname, --email, --comment, \
                 --groups, --enabled, or --expire)"
                    .into(),
            ));
        }
        Ok(changes)
    }
}

/// Body of `PUT /access/password`.
#[derive(Debug, Serialize)]
struct ChangePassword<'a> {
    userid: &'a str,
    password: &'a str,
}

/// User command executor.
pub struct UserCommand<'a> {
    client: &'a ApiClient,
}

impl<'a> UserCommand<'a> {
    /// Create a new user command.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Execute a user subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails, the response cannot be decoded,
    /// or the arguments are invalid.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &UserCommands,
    ) -> Result<(), CliError> {
        match command {
            UserCommands::List { enabled } => self.list(writer, format, *enabled).await,
            UserCommands::Show { userid } => self.show(writer, format, userid).await,
            UserCommands::Create(args) => {
                let body = CreateUser::from_args(args)?;
                let _: Value = self.client.post("/access/users", Some(&body)).await?;
                let msg = Message::success(format!("User '{}' created", args.userid));
                format.write(writer, &msg)
            }
            UserCommands::Modify(args) => {
                let body = ModifyUser::from_args(args)?;
                let _: Value = self
                    .client
                    .put(&format!("/access/users/{}", args.userid), Some(&body))
                    .await?;
                let msg = Message::success(format!("User '{}' updated", args.userid));
                format.write(writer, &msg)
            }
            UserCommands::Delete { userid, force } => {
                let question = format!("Are you sure you want to delete user '{userid}'?");
                if !confirmed(*force, &question)? {
                    return format.write(writer, &Message::aborted("Aborted."));
                }
                self.client.delete(&format!("/access/users/{userid}")).await?;
                format.write(writer, &Message::success(format!("User '{userid}' deleted")))
            }
            UserCommands::Passwd { userid, password } => {
                let password = match password {
                    Some(password) => password.clone(),
                    None => prompt::secret(&format!("New password for {userid}: "))?,
                };
                if password.is_empty() {
                    return Err(CliError::InvalidArgument("password cannot be empty".into()));
                }
                let body = ChangePassword { userid, password: &password };
                let _: Value = self.client.put("/access/password", Some(&body)).await?;
                debug!(userid = userid.as_str(), "password changed");

                let msg = Message::success(format!("Password changed for user '{userid}'"));
                format.write(writer, &msg)
            }
            UserCommands::Groups { userid } => self.groups(writer, format, userid).await,
        }
    }

    async fn list<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        enabled_only: bool,
    ) -> Result<(), CliError> {
        let data: Value = self.client.get("/access/users").await?;
        let data = if enabled_only {
            retain_enabled(data)
        } else {
            data
        };
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let users: Vec<User> = decode_list(data)?;
        let mut table = Table::new(&[
            "USERID", "FIRSTNAME", "LASTNAME", "EMAIL", "ENABLED", "EXPIRE", "GROUPS",
        ]);
        for user in &users {
            table.row([
                user.userid.clone(),
                user.firstname.clone(),
                user.lastname.clone(),
                user.email.clone(),
                format::yes_no(user.enable).to_string(),
                format::expiry(user.expire),
                user.groups.join(","),
            ]);
        }
        table.write_table(writer)
    }

    async fn show<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        userid: &str,
    ) -> Result<(), CliError> {
        let data: Value = self.client.get(&format!("/access/users/{userid}")).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let user: User = decode(data)?;
        // The single-user endpoint omits the id.
        let id = if user.userid.is_empty() {
            userid
        } else {
            user.userid.as_str()
        };
        let mut table = Table::fields();
        table.field("User ID", id);
        table.field("First Name", user.firstname.as_str());
        table.field("Last Name", user.lastname.as_str());
        table.field("Email", user.email.as_str());
        table.field("Comment", user.comment.as_str());
        table.field("Enabled", format::yes_no(user.enable));
        table.field("Expire", format::expiry(user.expire));
        table.field("Groups", user.groups.join(","));
        table.field("Keys", user.keys.as_str());
        table.write_table(writer)
    }

    async fn groups<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        userid: &str,
    ) -> Result<(), CliError> {
        let data: Value = self.client.get(&format!("/access/users/{userid}")).await?;
        let user: User = decode(data)?;
        if format.is_json() {
            return format.write_json(writer, &json!({"userid": userid, "groups": user.groups}));
        }

        if user.groups.is_empty() {
            let msg = Message::info(format!("User '{userid}' is not a member of any groups."));
            return format.write(writer, &msg);
        }
        let mut table = Table::new(&["GROUP"]);
        for group in &user.groups {
            table.row([group.as_str()]);
        }
        table.write_table(writer)
    }
}

/// Drop disabled accounts from a raw user listing.
fn retain_enabled(data: Value) -> Value {
    match data {
        Value::Array(users) => Value::Array(
            users
                .into_iter()
                .filter(|user| decode::<User>(user.clone()).is_ok_and(|u| u.enable))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{client_for, json as json_format, table, text};
    use httpmock::prelude::*;

    fn create_args(userid: &str) -> UserCreateArgs {
        UserCreateArgs {
            userid: userid.into(),
            password: None,
            firstname: None,
            lastname: None,
            email: None,
            comment: None,
            groups: None,
            expire: 0,
            enabled: true,
        }
    }

    fn modify_args() -> UserModifyArgs {
        UserModifyArgs {
            userid: "alice@pam".into(),
            firstname: None,
            lastname: None,
            email: None,
            comment: None,
            groups: None,
            expire: None,
            enabled: None,
        }
    }

    #[tokio::test]
    async fn list_shows_accounts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/access/users");
                then.status(200).json_body(json!({"data": [
                    {"userid": "root@pam", "enable": 1, "expire": 0},
                    {"userid": "alice@pve", "firstname": "Alice", "enable": 0,
                     "groups": "devs,ops"}
                ]}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        UserCommand::new(&client)
            .execute(&mut buf, &table(), &UserCommands::List { enabled: false })
            .await
            .expect("list");

        let out = text(buf);
        assert!(out.contains("root@pam                               yes      never"));
        assert!(out.contains("alice@pve  Alice                       no       never   devs,ops"));
    }

    #[tokio::test]
    async fn enabled_filter_applies_to_json() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/access/users");
                then.status(200).json_body(json!({"data": [
                    {"userid": "root@pam", "enable": 1},
                    {"userid": "alice@pve", "enable": 0}
                ]}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        UserCommand::new(&client)
            .execute(&mut buf, &json_format(), &UserCommands::List { enabled: true })
            .await
            .expect("list");

        let out: Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(out, json!([{"userid": "root@pam", "enable": 1}]));
    }

    #[tokio::test]
    async fn create_rejects_userid_without_realm() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api2/json/access/users");
                then.status(200).json_body(json!({"data": null}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let err = UserCommand::new(&client)
            .execute(&mut buf, &table(), &UserCommands::Create(create_args("alice")))
            .await
            .expect_err("should fail");

        assert!(err.to_string().contains("USER@REALM"));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn create_sends_given_fields() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api2/json/access/users").json_body(json!({
                    "userid": "alice@pve",
                    "enable": true,
                    "password": "s3cret",
                    "email": "alice@example.com",
                    "expire": 1_893_456_000
                }));
                then.status(200).json_body(json!({"data": null}));
            })
            .await;

        let mut args = create_args("alice@pve");
        args.password = Some("s3cret".into());
        args.email = Some("alice@example.com".into());
        args.expire = 1_893_456_000;
        let client = client_for(&server);
        let mut buf = Vec::new();
        UserCommand::new(&client)
            .execute(&mut buf, &table(), &UserCommands::Create(args))
            .await
            .expect("create");

        mock.assert_async().await;
        assert_eq!(text(buf), "✓ User 'alice@pve' created\n");
    }

    #[test]
    fn modify_without_changes_is_rejected() {
        let err = ModifyUser::from_args(&modify_args()).expect_err("should fail");
        assert!(err.to_string().starts_with("invalid argument: no changes specified"));
    }

    #[tokio::test]
    async fn modify_sends_only_changes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/api2/json/access/users/alice@pam")
                    .json_body(json!({"groups": "devs,ops", "expire": 0, "enable": false}));
                then.status(200).json_body(json!({"data": null}));
            })
            .await;

        let mut args = modify_args();
        args.groups = Some("devs,ops".into());
        args.expire = Some(0);
        args.enabled = Some(false);
        let client = client_for(&server);
        let mut buf = Vec::new();
        UserCommand::new(&client)
            .execute(&mut buf, &table(), &UserCommands::Modify(args))
            .await
            .expect("modify");

        mock.assert_async().await;
        assert_eq!(text(buf), "✓ User 'alice@pam' updated\n");
    }

    #[tokio::test]
    async fn passwd_with_flag() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/api2/json/access/password")
                    .json_body(json!({"userid": "alice@pam", "password": "n3w"}));
                then.status(200).json_body(json!({"data": null}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = UserCommands::Passwd {
            userid: "alice@pam".into(),
            password: Some("n3w".into()),
        };
        UserCommand::new(&client)
            .execute(&mut buf, &table(), &command)
            .await
            .expect("passwd");

        mock.assert_async().await;
        assert_eq!(text(buf), "✓ Password changed for user 'alice@pam'\n");
    }

    #[tokio::test]
    async fn empty_password_is_rejected() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = UserCommands::Passwd {
            userid: "alice@pam".into(),
            password: Some(String::new()),
        };
        let err = UserCommand::new(&client)
            .execute(&mut buf, &table(), &command)
            .await
            .expect_err("should fail");
        assert_eq!(err.to_string(), "invalid argument: password cannot be empty");
    }

    #[tokio::test]
    async fn show_fills_in_userid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/access/users/alice@pam");
                then.status(200).json_body(json!({"data": {
                    "firstname": "Alice", "enable": 1, "groups": ["devs", "ops"]
                }}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = UserCommands::Show { userid: "alice@pam".into() };
        UserCommand::new(&client)
            .execute(&mut buf, &table(), &command)
            .await
            .expect("show");

        let out = text(buf);
        assert!(out.contains("User ID     alice@pam"));
        assert!(out.contains("Groups      devs,ops"));
        assert!(out.contains("Expire      never"));
    }

    #[tokio::test]
    async fn groups_lists_membership() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/access/users/alice@pam");
                then.status(200).json_body(json!({"data": {"groups": "devs,ops"}}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = UserCommands::Groups { userid: "alice@pam".into() };
        UserCommand::new(&client)
            .execute(&mut buf, &table(), &command)
            .await
            .expect("groups");
        assert_eq!(text(buf), "GROUP\n─────\ndevs\nops\n");
    }

    #[tokio::test]
    async fn groups_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/access/users/bob@pve");
                then.status(200).json_body(json!({"data": {"userid": "bob@pve"}}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = UserCommands::Groups { userid: "bob@pve".into() };
        UserCommand::new(&client)
            .execute(&mut buf, &table(), &command)
            .await
            .expect("groups");
        assert_eq!(text(buf), "User 'bob@pve' is not a member of any groups.\n");
    }
}
