//! Broadcast: send one message (or replied-to media) to many dialogs
//!
//! With preview on, the job waits for the owner to answer `yes` or
//! `cancel` as a reply to the preview message before anything is sent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::application::services::{with_flood_retry, SessionStore};
use crate::domain::entities::{DispatchContext, MessageId, PeerId};
use crate::domain::traits::{Dialog, EventMatcher, ParseMode, RemoteFile};
use crate::infrastructure::config::BroadcastConfig;
use crate::infrastructure::storage::{write_json, JsonStore};
use super::trait_def::CommandHandler;

const PREFS_FILE: &str = "broadcast.json";
const HISTORY_DIR: &str = "broadcast-history";

/// Persisted broadcast preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastPrefs {
    pub preview: bool,
}

impl Default for BroadcastPrefs {
    fn default() -> Self {
        Self { preview: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Group,
    Channel,
    /// Every dialog: groups, channels and users
    Auto,
}

impl TargetKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "group" => Some(TargetKind::Group),
            "channel" => Some(TargetKind::Channel),
            "auto" => Some(TargetKind::Auto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Group => "group",
            TargetKind::Channel => "channel",
            TargetKind::Auto => "auto",
        }
    }

    pub fn accepts(&self, dialog: &Dialog) -> bool {
        match self {
            TargetKind::Group => dialog.is_group(),
            TargetKind::Channel => dialog.is_channel(),
            TargetKind::Auto => dialog.is_group() || dialog.is_channel() || dialog.is_user(),
        }
    }
}

/// Batching and timing knobs
#[derive(Debug, Clone)]
pub struct BroadcastOptions {
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub flood_ceiling: Duration,
    pub confirm_timeout: Duration,
}

impl From<&BroadcastConfig> for BroadcastOptions {
    fn from(config: &BroadcastConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            batch_pause: config.batch_pause(),
            flood_ceiling: config.flood_ceiling(),
            confirm_timeout: config.confirm_timeout(),
        }
    }
}

/// A broadcast that has been validated and has its target list
#[derive(Debug, Clone)]
pub struct BroadcastJob {
    pub id: Uuid,
    pub origin: PeerId,
    pub kind: TargetKind,
    pub text: String,
    pub markdown: bool,
    pub reply_to: Option<MessageId>,
    pub targets: Vec<Dialog>,
    /// Matching dialogs left out because they are blacklisted
    pub skipped: Vec<PeerId>,
}

impl BroadcastJob {
    /// Markdown only when asked for and the text actually uses markup
    fn parse_mode(&self) -> ParseMode {
        let has_markup = self.text.contains(['*', '_', '`', '[', ']']);
        if self.markdown && has_markup {
            ParseMode::Markdown
        } else {
            ParseMode::Plain
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub sent: Vec<PeerId>,
    pub failed: Vec<PeerId>,
    pub skipped: Vec<PeerId>,
}

impl BroadcastReport {
    pub fn summary(&self) -> String {
        format!(
            "✅ Broadcast finished!\n\n📤 Sent: {}\n🚫 Failed: {}\n⛔ Skipped: {}",
            self.sent.len(),
            self.failed.len(),
            self.skipped.len()
        )
    }
}

/// One file per finished broadcast under `broadcast-history/`
#[derive(Debug, Serialize)]
struct HistoryEntry<'a> {
    id: Uuid,
    #[serde(rename = "type")]
    kind: &'a str,
    message: &'a str,
    sent: &'a [PeerId],
    failed: &'a [PeerId],
    skipped: &'a [PeerId],
    time: DateTime<Utc>,
}

pub struct BroadcastHandler {
    options: BroadcastOptions,
    /// Jobs awaiting confirmation, keyed by the requesting sender
    pending: Arc<SessionStore<i64, BroadcastJob>>,
}

impl BroadcastHandler {
    pub fn new(options: BroadcastOptions) -> Self {
        let pending = Arc::new(SessionStore::new(options.confirm_timeout));
        Self { options, pending }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn prefs(ctx: &BotContext) -> JsonStore<BroadcastPrefs> {
        JsonStore::new(ctx.data_dir.join(PREFS_FILE))
    }

    async fn toggle_preview(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError> {
        let store = Self::prefs(ctx);
        let value = cmd.args.get(1).map(|v| v.to_lowercase());

        let reply = match value.as_deref() {
            Some(v @ ("on" | "off")) => {
                let on = v == "on";
                store.update(|p| p.preview = on).await?;
                format!("✅ Preview {}", v.to_uppercase())
            }
            _ => {
                let current = store.load().await;
                format!(
                    "📢 Preview: {}\nUsage: {}broadcast preview on/off",
                    if current.preview { "ON" } else { "OFF" },
                    ctx.prefix
                )
            }
        };

        ctx.reply(cmd, &reply).await?;
        Ok(())
    }

    /// Post the preview and wait in the background for a yes/cancel reply
    async fn request_confirmation(&self, cmd: &DispatchContext, ctx: &BotContext, job: BroadcastJob) -> Result<(), BotError> {
        let preview = format!(
            "📢 **Broadcast Preview**\n\nType: {}\nTotal targets: {}\n\n**Message:**\n{}\n\nReply **yes** to send or **cancel** to abort.",
            job.kind.as_str(),
            job.targets.len(),
            if job.text.is_empty() { "(media)" } else { job.text.as_str() }
        );
        let preview_id = ctx.reply_markdown(cmd, &preview).await?;

        let sender = cmd.event.sender.id;
        let job_id = job.id;
        let matcher = EventMatcher::in_chat(job.origin)
            .from_sender(sender)
            .replying_to(preview_id);
        let mut subscription = ctx.client.subscribe(matcher);

        self.pending.purge_expired();
        if self.pending.insert(sender, job).is_some() {
            tracing::info!(sender, "Replaced an unconfirmed broadcast");
        }

        let pending = Arc::clone(&self.pending);
        let options = self.options.clone();
        let ctx = ctx.clone();
        let deadline = tokio::time::Instant::now() + self.options.confirm_timeout;

        tokio::spawn(async move {
            loop {
                let reply = match tokio::time::timeout_at(deadline, subscription.recv()).await {
                    Ok(Some(reply)) => reply,
                    Ok(None) => return,
                    Err(_) => {
                        if let Some(job) = pending.take_if(&sender, |j| j.id == job_id) {
                            if let Err(e) = ctx
                                .client
                                .send_text(job.origin, "⌛ Broadcast preview expired.", ParseMode::Plain)
                                .await
                            {
                                tracing::warn!("Failed to send broadcast expiry notice to {}: {}", job.origin, e);
                            }
                        }
                        return;
                    }
                };

                let answer = reply.text.unwrap_or_default().trim().to_lowercase();
                match answer.as_str() {
                    "yes" => {
                        if let Some(job) = pending.take_if(&sender, |j| j.id == job_id) {
                            if let Err(e) = run_broadcast(&ctx, &options, job).await {
                                tracing::error!("Broadcast {} failed: {}", job_id, e);
                            }
                        }
                        return;
                    }
                    "cancel" => {
                        if let Some(job) = pending.take_if(&sender, |j| j.id == job_id) {
                            if let Err(e) = ctx
                                .client
                                .send_text(job.origin, "❌ Broadcast cancelled.", ParseMode::Plain)
                                .await
                            {
                                tracing::warn!("Failed to send broadcast cancel notice to {}: {}", job.origin, e);
                            }
                        }
                        return;
                    }
                    _ => continue,
                }
            }
        });

        Ok(())
    }
}

/// Send `job` to every target in batches and report per-target results
pub async fn run_broadcast(ctx: &BotContext, options: &BroadcastOptions, job: BroadcastJob) -> Result<BroadcastReport, BotError> {
    let media = match job.reply_to {
        Some(message) => match ctx.client.download_media(job.origin, message).await {
            Ok(bytes) if !bytes.is_empty() => {
                let name = format!("broadcast_{}.bin", job.id.simple());
                Some(ctx.client.upload_file(&name, bytes).await?)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Could not download broadcast media: {}", e);
                None
            }
        },
        None => None,
    };

    if media.is_none() && job.text.is_empty() {
        ctx.client
            .send_text(job.origin, "❌ Nothing to broadcast: the replied message has no media.", ParseMode::Plain)
            .await?;
        return Ok(BroadcastReport::default());
    }

    ctx.client
        .send_text(job.origin, &format!("📣 Sending to {} targets...", job.targets.len()), ParseMode::Plain)
        .await?;

    let mode = job.parse_mode();
    let mut report = BroadcastReport {
        skipped: job.skipped.clone(),
        ..Default::default()
    };

    for (i, batch) in job.targets.chunks(options.batch_size.max(1)).enumerate() {
        if i > 0 && !options.batch_pause.is_zero() {
            tokio::time::sleep(options.batch_pause).await;
        }

        let mut set = JoinSet::new();
        for target in batch {
            let peer = target.id;
            let client = Arc::clone(&ctx.client);
            let text = job.text.clone();
            let media: Option<RemoteFile> = media.clone();
            let ceiling = options.flood_ceiling;

            set.spawn(async move {
                let result = with_flood_retry(ceiling, || {
                    let client = Arc::clone(&client);
                    let text = text.clone();
                    let media = media.clone();
                    async move {
                        match media {
                            Some(file) => client.send_file(peer, &file, &text, mode).await,
                            None => client.send_text(peer, &text, mode).await,
                        }
                    }
                })
                .await;
                (peer, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((peer, Ok(_))) => report.sent.push(peer),
                Ok((peer, Err(e))) => {
                    tracing::warn!("Broadcast to {} failed: {}", peer, e);
                    report.failed.push(peer);
                }
                Err(e) => tracing::error!("Broadcast send task panicked: {}", e),
            }
        }
    }

    report.sent.sort_unstable();
    report.failed.sort_unstable();

    ctx.client.send_text(job.origin, &report.summary(), ParseMode::Plain).await?;

    let now = Utc::now();
    let entry = HistoryEntry {
        id: job.id,
        kind: job.kind.as_str(),
        message: &job.text,
        sent: &report.sent,
        failed: &report.failed,
        skipped: &report.skipped,
        time: now,
    };
    let file = ctx
        .data_dir
        .join(HISTORY_DIR)
        .join(format!("{}.json", now.format("%Y-%m-%dT%H-%M-%S-%3fZ")));
    if let Err(e) = write_json(&file, &entry).await {
        tracing::warn!("Could not write broadcast history: {}", e);
    }

    tracing::info!(
        id = %job.id,
        sent = report.sent.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "Broadcast finished"
    );
    Ok(report)
}

#[async_trait]
impl CommandHandler for BroadcastHandler {
    async fn handle(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError> {
        if cmd.args.first().map(|a| a.eq_ignore_ascii_case("preview")).unwrap_or(false) {
            return self.toggle_preview(cmd, ctx).await;
        }

        let mut consumed = 0;
        let markdown = cmd.args.first().map(|a| a == "--md").unwrap_or(false);
        if markdown {
            consumed += 1;
        }

        let Some(kind) = cmd.args.get(consumed).and_then(|a| TargetKind::parse(a)) else {
            ctx.reply(cmd, "❌ Type must be: group / channel / auto").await?;
            return Ok(());
        };
        consumed += 1;

        let text = cmd.text_after(consumed);
        let reply_to = cmd.event.reply_to;
        if text.is_empty() && reply_to.is_none() {
            ctx.reply(cmd, "❌ Send text or reply to media to broadcast.").await?;
            return Ok(());
        }

        let blacklist = ctx.blacklist.load().await;
        let whitelist = ctx.whitelist.load().await;
        let restricted = whitelist.enabled && !whitelist.is_empty();
        let mut targets = Vec::new();
        let mut skipped = Vec::new();
        for dialog in ctx.client.list_dialogs().await? {
            if !kind.accepts(&dialog) {
                continue;
            }
            // an active whitelist narrows the candidates to matching ids or titles
            if restricted && !whitelist.contains(dialog.id) && !whitelist.contains(&dialog.title) {
                continue;
            }
            if blacklist.enabled && blacklist.contains(dialog.id) {
                skipped.push(dialog.id);
            } else {
                targets.push(dialog);
            }
        }

        if targets.is_empty() {
            ctx.reply(cmd, "❌ No targets found.").await?;
            return Ok(());
        }

        let job = BroadcastJob {
            id: Uuid::new_v4(),
            origin: cmd.peer(),
            kind,
            text,
            markdown,
            reply_to,
            targets,
            skipped,
        };

        if Self::prefs(ctx).load().await.preview {
            self.request_confirmation(cmd, ctx, job).await
        } else {
            run_broadcast(ctx, &self.options, job).await?;
            Ok(())
        }
    }
}
