//! Scheduled backup jobs under `/cluster/backup`.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::cli::{JobCommands, JobCreateArgs, JobModifyArgs};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::format;
use crate::output::{Message, OutputFormat, Table, TableDisplay};
use crate::resources::{BackupJob, decode, decode_list};

use super::confirmed;

/// Body of `POST /cluster/backup`.
#[derive(Debug, Serialize)]
struct CreateJob<'a> {
    storage: &'a str,
    schedule: &'a str,
    mode: &'a str,
    compress: &'a str,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    all: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vmid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mailto: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maxfiles: Option<u32>,
    #[serde(rename = "notes-template", skip_serializing_if = "Option::is_none")]
    notes_template: Option<&'a str>,
}

impl<'a> CreateJob<'a> {
    fn from_args(args: &'a JobCreateArgs) -> Result<Self, CliError> {
        let vmids = args.vmids.as_deref().filter(|v| !v.is_empty());
        if !args.all && vmids.is_none() {
            return Err(CliError::InvalidArgument("specify --vmids or --all".into()));
        }
        Ok(Self {
            storage: &args.storage,
            schedule: &args.schedule,
            mode: &args.mode,
            compress: &args.compress,
            enabled: args.enabled,
            all: args.all.then_some(1),
            vmid: if args.all { None } else { vmids },
            mailto: args.mailto.as_deref(),
            maxfiles: (args.max_files > 0).then_some(args.max_files),
            notes_template: args.notes.as_deref(),
        })
    }
}

/// Body of `PUT /cluster/backup/{id}`.
#[derive(Debug, Serialize)]
struct ModifyJob<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    vmid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compress: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mailto: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maxfiles: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
}

impl<'a> ModifyJob<'a> {
    fn from_args(args: &'a JobModifyArgs) -> Result<Self, CliError> {
        let changes = Self {
            vmid: args.vmids.as_deref(),
            storage: args.storage.as_deref(),
            schedule: args.schedule.as_deref(),
            mode: args.mode.as_deref(),
            compress: args.compress.as_deref(),
            mailto: args.mailto.as_deref(),
            maxfiles: args.max_files.filter(|n| *n > 0),
            enabled: args.enabled,
        };
        let empty = changes.vmid.is_none()
            && changes.storage.is_none()
            && changes.schedule.is_none()
            && changes.mode.is_none()
            && changes.compress.is_none()
            && changes.mailto.is_none()
            && changes.maxfiles.is_none()
            && changes.enabled.is_none();
        if empty {
            return Err(CliError::InvalidArgument("no changes specified".into()));
        }
        Ok(changes)
    }
}

pub(super) struct JobsCommand<'a> {
    client: &'a ApiClient,
}

impl<'a> JobsCommand<'a> {
    pub(super) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub(super) async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &JobCommands,
    ) -> Result<(), CliError> {
        match command {
            JobCommands::List => self.list(writer, format).await,
            JobCommands::Show { id } => self.show(writer, format, id).await,
            JobCommands::Create(args) => {
                let body = CreateJob::from_args(args)?;
                let _: Value = self.client.post("/cluster/backup", Some(&body)).await?;
                let msg = Message::success(format!(
                    "Scheduled backup job created (storage: {}, schedule: {})",
                    args.storage, args.schedule
                ));
                format.write(writer, &msg)
            }
            JobCommands::Modify(args) => {
                let body = ModifyJob::from_args(args)?;
                let _: Value = self
                    .client
                    .put(&format!("/cluster/backup/{}", args.id), Some(&body))
                    .await?;
                format.write(writer, &Message::success(format!("Backup job '{}' updated", args.id)))
            }
            JobCommands::Delete { id, force } => {
                if !confirmed(*force, &format!("Delete backup job '{id}'?"))? {
                    return format.write(writer, &Message::aborted("Aborted."));
                }
                self.client.delete(&format!("/cluster/backup/{id}")).await?;
                format.write(writer, &Message::success(format!("Backup job '{id}' deleted")))
            }
        }
    }

    async fn list<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let data: Value = self.client.get("/cluster/backup").await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let jobs: Vec<BackupJob> = decode_list(data)?;
        if jobs.is_empty() {
            return format.write(writer, &Message::info("No scheduled backup jobs found."));
        }

        let mut table = Table::new(&["JOB ID", "VMIDS", "STORAGE", "SCHEDULE", "MODE", "ENABLED"]);
        for job in &jobs {
            table.row([
                job.id.clone(),
                job.guests().to_string(),
                job.storage.clone(),
                job.schedule.clone(),
                job.mode.clone(),
                format::yes_no(job.enabled).to_string(),
            ]);
        }
        table.write_table(writer)
    }

    async fn show<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        id: &str,
    ) -> Result<(), CliError> {
        let data: Value = self.client.get(&format!("/cluster/backup/{id}")).await?;
        if format.is_json() {
            return format.write_json(writer, &data);
        }

        let job: BackupJob = decode(data)?;
        let mut table = Table::fields();
        table.field("Job ID", job.id.as_str());
        table.field("VM IDs", job.guests());
        table.field("Storage", job.storage.as_str());
        table.field("Schedule", job.schedule.as_str());
        table.field("Mode", job.mode.as_str());
        table.field("Compression", job.compress.as_str());
        table.field("Enabled", format::yes_no(job.enabled));
        table.field("Mail To", job.mailto.as_str());
        table.field("Max Files", job.maxfiles.as_str());
        table.field("Notes Template", job.notes_template.as_str());
        table.write_table(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{client_for, table, text};
    use httpmock::prelude::*;
    use serde_json::json;

    fn create_args() -> JobCreateArgs {
        JobCreateArgs {
            vmids: Some("100,101".into()),
            all: false,
            storage: "pbs".into(),
            schedule: "0 2 * * *".into(),
            mode: "snapshot".into(),
            compress: "zstd".into(),
            mailto: None,
            max_files: 0,
            notes: Some("{{guestname}}".into()),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn list_renders_jobs() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/cluster/backup");
                then.status(200).json_body(json!({"data": [
                    {"id": "backup-a1", "vmid": "100,101", "storage": "pbs",
                     "schedule": "sun 01:00", "mode": "snapshot", "enabled": 0},
                    {"id": "backup-b2", "all": 1, "storage": "local", "schedule": "daily",
                     "mode": "stop"}
                ]}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        JobsCommand::new(&client)
            .execute(&mut buf, &table(), &JobCommands::List)
            .await
            .expect("list");

        let out = text(buf);
        assert!(out.contains("backup-a1  100,101  pbs      sun 01:00  snapshot  no"));
        assert!(out.contains("backup-b2  all      local    daily      stop      yes"));
    }

    #[tokio::test]
    async fn empty_list_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/cluster/backup");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        JobsCommand::new(&client)
            .execute(&mut buf, &table(), &JobCommands::List)
            .await
            .expect("list");
        assert_eq!(text(buf), "No scheduled backup jobs found.\n");
    }

    #[tokio::test]
    async fn show_job_fields() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api2/json/cluster/backup/backup-a1");
                then.status(200).json_body(json!({"data": {
                    "id": "backup-a1", "vmid": "100", "storage": "pbs", "compress": "zstd",
                    "maxfiles": 7, "notes-template": "{{guestname}}"
                }}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        JobsCommand::new(&client)
            .execute(&mut buf, &table(), &JobCommands::Show { id: "backup-a1".into() })
            .await
            .expect("show");

        let out = text(buf);
        assert!(out.contains("Compression     zstd"));
        assert!(out.contains("Enabled         yes"));
        assert!(out.contains("Max Files       7"));
        assert!(out.contains("Notes Template  {{guestname}}"));
    }

    #[tokio::test]
    async fn create_posts_job() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api2/json/cluster/backup").json_body(json!({
                    "storage": "pbs",
                    "schedule": "0 2 * * *",
                    "mode": "snapshot",
                    "compress": "zstd",
                    "enabled": true,
                    "vmid": "100,101",
                    "notes-template": "{{guestname}}"
                }));
                then.status(200).json_body(json!({"data": null}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        JobsCommand::new(&client)
            .execute(&mut buf, &table(), &JobCommands::Create(create_args()))
            .await
            .expect("create");

        mock.assert_async().await;
        assert_eq!(
            text(buf),
            "✓ Scheduled backup job created (storage: pbs, schedule: 0 2 * * *)\n"
        );
    }

    #[test]
    fn create_with_all_ignores_vmids() {
        let mut args = create_args();
        args.all = true;
        let body = serde_json::to_value(CreateJob::from_args(&args).expect("body")).expect("json");
        assert_eq!(body["all"], 1);
        assert!(body.get("vmid").is_none());
    }

    #[test]
    fn create_needs_guests() {
        let mut args = create_args();
        args.vmids = None;
        let err = CreateJob::from_args(&args).expect_err("should fail");
        assert_eq!(err.to_string(), "invalid argument: specify --vmids or --all");
    }

    #[tokio::test]
    async fn modify_sends_changes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/api2/json/cluster/backup/backup-a1")
                    .json_body(json!({"schedule": "sat 03:00", "enabled": false}));
                then.status(200).json_body(json!({"data": null}));
            })
            .await;

        let args = JobModifyArgs {
            id: "backup-a1".into(),
            vmids: None,
            storage: None,
            schedule: Some("sat 03:00".into()),
            mode: None,
            compress: None,
            mailto: None,
            max_files: None,
            enabled: Some(false),
        };
        let client = client_for(&server);
        let mut buf = Vec::new();
        JobsCommand::new(&client)
            .execute(&mut buf, &table(), &JobCommands::Modify(args))
            .await
            .expect("modify");

        mock.assert_async().await;
        assert_eq!(text(buf), "✓ Backup job 'backup-a1' updated\n");
    }

    #[test]
    fn modify_without_changes_is_rejected() {
        let args = JobModifyArgs {
            id: "backup-a1".into(),
            vmids: None,
            storage: None,
            schedule: None,
            mode: None,
            compress: None,
            mailto: None,
            max_files: Some(0),
            enabled: None,
        };
        let err = ModifyJob::from_args(&args).expect_err("should fail");
        assert_eq!(err.to_string(), "invalid argument: no changes specified");
    }

    #[tokio::test]
    async fn forced_delete() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api2/json/cluster/backup/backup-a1");
                then.status(200).json_body(json!({"data": null}));
            })
            .await;

        let client = client_for(&server);
        let mut buf = Vec::new();
        let command = JobCommands::Delete { id: "backup-a1".into(), force: true };
        JobsCommand::new(&client)
            .execute(&mut buf, &table(), &command)
            .await
            .expect("delete");

        mock.assert_async().await;
        assert_eq!(text(buf), "✓ Backup job 'backup-a1' deleted\n");
    }
}
