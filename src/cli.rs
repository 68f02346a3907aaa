use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::LoadedEvent;
use crate::client::ApiClient;
use crate::ical::ScheduleExporter;
use crate::models::{ChinbaEventDetail, UpsertBoardGroup};
use crate::notices::{self, NoticeActions, NoticeFeed, NoticeFilter};
use crate::onboarding;
use crate::preferences::{self, Preferences};
use crate::schedule::freetime::DEFAULT_RECOMMENDATIONS;
use crate::schedule::slot::{format_hhmm, weekday_label};
use crate::schedule::{Heatmap, Severity, SlotKey, SlotSelection, free_windows, recommend};
use crate::settings::Settings;
use crate::store::{FileStore, KeyValueStore, MemoryStore};

#[derive(Debug, Parser)]
#[command(name = "zerotime", version, about = "University notices and group scheduling")]
pub struct Cli {
    /// Keep local state in memory instead of the store file.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List notices from the feed
    Notices {
        /// ALL, UNREAD, FAVORITE or KEYWORD; defaults to the last used filter
        #[arg(short, long)]
        filter: Option<NoticeFilter>,

        /// Number of cursor pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Mark a notice as read
    Read { notice_id: i64 },

    /// Toggle a notice's favorite flag
    Favorite { notice_id: i64 },

    /// Manage notice keywords
    #[command(subcommand)]
    Keywords(KeywordCommand),

    /// Show or change the boards the feed follows
    #[command(subcommand)]
    Boards(BoardCommand),

    /// Group scheduling
    #[command(subcommand)]
    Chinba(ChinbaCommand),

    /// Show the weekly timetable
    Timetable {
        #[arg(long)]
        semester: Option<String>,

        /// Also write the week as an .ics file
        #[arg(long)]
        ics: Option<PathBuf>,
    },

    /// End the session
    Logout,
}

#[derive(Debug, Subcommand)]
pub enum KeywordCommand {
    List,
    Add { keyword: String },
    Remove { keyword_id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum BoardCommand {
    Show,
    Set {
        #[arg(required = true)]
        board_codes: Vec<String>,
    },
    /// Save the given boards as a named group
    Group {
        name: String,
        #[arg(required = true)]
        board_codes: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ChinbaCommand {
    /// Events you created or joined
    List,
    Create {
        title: String,
        #[arg(required = true)]
        dates: Vec<NaiveDate>,
    },
    /// Heatmap, free windows and recommendations
    Show { event_id: String },
    /// Replace your unavailable slots (e.g. 2024-05-20T09:30:00)
    Save { event_id: String, slots: Vec<SlotKey> },
    /// Fill your unavailable slots from your timetable
    Import { event_id: String },
    Complete { event_id: String },
    Delete { event_id: String },
    /// Write recommended times (or free windows) as .ics
    Export {
        event_id: String,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        free: bool,
    },
}

fn open_store(settings: &Settings, ephemeral: bool) -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    if ephemeral {
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(FileStore::open(&settings.store_path)?))
}

pub async fn execute(cli: Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let api = ApiClient::from_settings(settings);
    let prefs = Preferences::new(open_store(settings, cli.ephemeral)?);

    if let Err(err) = onboarding::resume_pending(&api, &prefs).await {
        warn!(error = %err, "pending onboarding could not be submitted");
    }

    match cli.command {
        Command::Notices { filter, pages } => list_notices(&api, &prefs, filter, pages).await?,
        Command::Read { notice_id } => {
            actions(&api).mark_as_read(notice_id).await?;
            println!("notice {notice_id} marked as read");
        }
        Command::Favorite { notice_id } => {
            actions(&api).toggle_favorite(notice_id).await?;
            println!("notice {notice_id} favorite toggled");
        }
        Command::Keywords(cmd) => keywords(&api, cmd).await?,
        Command::Boards(cmd) => boards(&api, &prefs, cmd).await?,
        Command::Chinba(cmd) => chinba(&api, &prefs, settings, cmd).await?,
        Command::Timetable { semester, ics } => match api.user_timetable(semester.as_deref()).await? {
            None => println!("no timetable yet"),
            Some(timetable) => {
                for class in &timetable.classes {
                    let day = class.weekday().map(weekday_label).unwrap_or("?");
                    println!(
                        "{day} {}-{} {} {}",
                        format_hhmm(class.start_time),
                        format_hhmm(class.end_time),
                        class.name,
                        class.location.as_deref().unwrap_or("")
                    );
                }
                if let Some(path) = ics {
                    let bytes = ScheduleExporter::new().export_timetable(&timetable.classes, settings.today());
                    std::fs::write(&path, bytes)?;
                    info!(path = %path.display(), "timetable exported");
                }
            }
        },
        Command::Logout => {
            api.logout().await?;
            prefs.clear_subscriptions()?;
            println!("signed out");
        }
    }
    Ok(())
}

fn actions(api: &ApiClient) -> NoticeActions {
    NoticeActions::new(api.clone(), Arc::new(Mutex::new(NoticeFeed::new())))
}

async fn list_notices(
    api: &ApiClient,
    prefs: &Preferences,
    filter: Option<NoticeFilter>,
    pages: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let logged_in = api.session().is_logged_in();
    if let Some(filter) = filter {
        if filter.requires_login() && !logged_in {
            println!("{filter} requires sign-in, showing ALL");
        }
        prefs.set_current_filter(filter)?;
    }
    let filter = prefs.current_filter(logged_in)?;
    let boards = preferences::load_selected_boards(api, prefs).await?;

    let actions = actions(api);
    if filter != NoticeFilter::Keyword {
        let server_boards: &[String] = if logged_in { &boards } else { &[] };
        for _ in 0..pages.max(1) {
            if actions
                .load_next_page(server_boards, filter == NoticeFilter::Favorite)
                .await?
                == 0
            {
                break;
            }
        }
    }

    if logged_in && !api.my_keywords().await?.is_empty() {
        let keyword_notices = api.keyword_notices(0, 200, true).await?;
        let badge = notices::keyword_badge(&keyword_notices, prefs)?;
        if badge.has_new {
            println!("{} new keyword notice(s)", badge.new_count);
        }
        if filter == NoticeFilter::Keyword {
            notices::mark_keyword_notices_seen(&keyword_notices, prefs)?;
        }
        actions.feed().lock().await.set_keyword_notices(keyword_notices);
    }

    let feed = actions.feed().lock().await;
    for notice in notices::filter_notices(&feed, &boards, logged_in, filter) {
        let marker = match (notice.is_read, notice.is_favorite) {
            (_, true) => '*',
            (false, false) => '+',
            (true, false) => ' ',
        };
        println!("{marker} {:>7} [{}] {} {}", notice.id, notice.board_code, notice.date, notice.title);
    }
    Ok(())
}

async fn keywords(api: &ApiClient, cmd: KeywordCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        KeywordCommand::List => {
            for keyword in api.my_keywords().await? {
                println!("{:>5} {}", keyword.id, keyword.keyword);
            }
        }
        KeywordCommand::Add { keyword } => {
            let added = api.add_keyword(&keyword).await?;
            println!("added keyword {} ({})", added.keyword, added.id);
        }
        KeywordCommand::Remove { keyword_id } => {
            println!("{}", api.delete_keyword(keyword_id).await?.message);
        }
    }
    Ok(())
}

async fn boards(api: &ApiClient, prefs: &Preferences, cmd: BoardCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        BoardCommand::Show => {
            println!("{}", preferences::load_selected_boards(api, prefs).await?.join(", "));
            let user = match api.session().user() {
                Some(user) => Some(user),
                None if api.session().is_logged_in() => api.me().await.ok(),
                None => None,
            };
            if let Some(user) = user {
                let groups = match api.my_board_groups().await {
                    Ok(groups) => {
                        prefs.cache_board_groups(&user.email, &groups)?;
                        groups
                    }
                    Err(err) => {
                        warn!(error = %err, "using cached board groups");
                        prefs.cached_board_groups(&user.email)?
                    }
                };
                for group in groups {
                    println!("  {}: {}", group.name, group.board_codes.join(", "));
                }
            }
        }
        BoardCommand::Set { board_codes } => {
            let saved = preferences::save_selected_boards(api, prefs, &board_codes).await?;
            println!("following {}", saved.join(", "));
        }
        BoardCommand::Group { name, board_codes } => {
            let group = api.upsert_board_group(&UpsertBoardGroup { name, board_codes }).await?;
            println!("saved group {} ({})", group.name, group.id);
        }
    }
    Ok(())
}

/// Text grid: one column per date, one row per slot, with the
/// unavailable count and severity level of each cell.
pub fn render_heatmap(event: &ChinbaEventDetail, heatmap: &Heatmap) -> String {
    let layout = event.layout();
    let mut out = String::new();
    let _ = write!(out, "{:>5}", "");
    for date in layout.dates() {
        let _ = write!(out, " {:>9}", format!("{}({})", date.format("%m/%d"), weekday_label(date.weekday())));
    }
    out.push('\n');
    for time in layout.rows() {
        let _ = write!(out, "{}", format_hhmm(time));
        for date in layout.dates() {
            let cell = match SlotKey::new(*date, time) {
                Ok(key) => {
                    let count = heatmap.count(&key);
                    match heatmap.severity(&key) {
                        Severity::Neutral => "-".to_string(),
                        severity => format!("{count}/{} L{}", heatmap.total_participants(), severity.level()),
                    }
                }
                Err(_) => "?".to_string(),
            };
            let _ = write!(out, " {cell:>9}");
        }
        out.push('\n');
    }
    out
}

async fn chinba(
    api: &ApiClient,
    prefs: &Preferences,
    settings: &Settings,
    cmd: ChinbaCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let today = settings.today();
    match cmd {
        ChinbaCommand::List => {
            for event in api.my_events().await? {
                let status = crate::models::effective_status(event.status, &event.dates, today);
                println!(
                    "{} {} [{}] {}/{} submitted",
                    event.event_id, event.title, status, event.submitted_count, event.participant_count
                );
            }
        }
        ChinbaCommand::Create { title, dates } => {
            prefs.save_create_draft(&preferences::CreateEventDraft {
                title: title.clone(),
                dates: dates.clone(),
            })?;
            let created = api.create_event(&title, &dates).await?;
            prefs.clear_create_draft()?;
            println!("created event {}", created.event_id);
        }
        ChinbaCommand::Show { event_id } => {
            let LoadedEvent { detail, participation } = api.load_event(&event_id).await?;
            let heatmap = detail.heatmap();
            println!(
                "{} [{}] {}/{} submitted",
                detail.title,
                detail.effective_status(today),
                detail.submitted_count(),
                detail.participants.len()
            );
            print!("{}", render_heatmap(&detail, &heatmap));

            let layout = detail.layout();
            println!("free windows:");
            for window in free_windows(&heatmap, &layout) {
                println!(
                    "  {} {} {}-{}",
                    window.date,
                    weekday_label(window.weekday),
                    format_hhmm(window.start_time),
                    format_hhmm(window.end_time)
                );
            }
            println!("recommended:");
            for rec in recommend(&heatmap, &layout, DEFAULT_RECOMMENDATIONS) {
                println!(
                    "  {} {}-{} ({} available{})",
                    rec.date,
                    format_hhmm(rec.start_time),
                    format_hhmm(rec.end_time),
                    rec.available_count,
                    if rec.all_available { ", everyone" } else { "" }
                );
            }
            println!("your unavailable slots: {}", participation.unavailable_slots.len());
            if let Some(draft) = prefs.schedule_draft(&event_id)? {
                println!("unsaved draft with {} slot(s) from {}", draft.slots.len(), draft.updated_at);
            }
        }
        ChinbaCommand::Save { event_id, slots } => {
            let event = api.event_detail(&event_id).await?;
            let selection: SlotSelection = slots.into_iter().collect();
            if let Err(err) = api.save_unavailability(&event, &selection, today).await {
                prefs.save_schedule_draft(&event_id, &selection)?;
                return Err(err.into());
            }
            prefs.clear_schedule_draft(&event_id)?;
            println!("saved {} unavailable slot(s)", selection.len());
        }
        ChinbaCommand::Import { event_id } => {
            let response = api.import_timetable_into_event(&event_id).await?;
            println!("{} ({} slots)", response.message, response.imported_count);
        }
        ChinbaCommand::Complete { event_id } => {
            api.complete_event(&event_id).await?;
            println!("event {event_id} completed");
        }
        ChinbaCommand::Delete { event_id } => {
            api.delete_event(&event_id).await?;
            println!("event {event_id} deleted");
        }
        ChinbaCommand::Export { event_id, out, free } => {
            let event = api.event_detail(&event_id).await?;
            let heatmap = event.heatmap();
            let layout = event.layout();
            let exporter = ScheduleExporter::new();
            let bytes = if free {
                exporter.export_free_windows(&event.title, &free_windows(&heatmap, &layout))
            } else {
                exporter.export_recommendations(&event, &recommend(&heatmap, &layout, DEFAULT_RECOMMENDATIONS))
            };
            if bytes.is_empty() {
                println!("nothing to export");
            } else {
                std::fs::write(&out, bytes)?;
                println!("wrote {}", out.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;
    use crate::models::{EventStatus, HeatmapSlot};

    #[test]
    fn test_parse_chinba_save() {
        let cli = Cli::try_parse_from(["zerotime", "chinba", "save", "evt1", "2024-05-20T09:30:00"]).unwrap();
        match cli.command {
            Command::Chinba(ChinbaCommand::Save { event_id, slots }) => {
                assert_eq!(event_id, "evt1");
                assert_eq!(slots[0].as_str(), "2024-05-20T09:30:00");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_misaligned_slot() {
        let err = Cli::try_parse_from(["zerotime", "chinba", "save", "evt1", "2024-05-20T09:15:00"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_parse_notice_filter() {
        let cli = Cli::try_parse_from(["zerotime", "--ephemeral", "notices", "-f", "unread"]).unwrap();
        assert!(cli.ephemeral);
        assert!(matches!(
            cli.command,
            Command::Notices { filter: Some(NoticeFilter::Unread), pages: 1 }
        ));
    }

    #[test]
    fn test_render_heatmap() {
        let event = ChinbaEventDetail {
            event_id: "evt1".into(),
            title: "Study".into(),
            dates: vec![NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()],
            start_hour: 9,
            end_hour: 10,
            status: EventStatus::Active,
            creator_id: 1,
            creator_nickname: None,
            participants: Vec::new(),
            heatmap: Vec::new(),
            recommended_times: Vec::new(),
            created_at: "2024-05-01T00:00:00".into(),
        };
        let heatmap = Heatmap::from_slots(
            vec![HeatmapSlot {
                dt: SlotKey::parse("2024-05-20T09:00:00").unwrap(),
                unavailable_count: 2,
                unavailable_members: vec!["A".into(), "B".into()],
            }],
            2,
        );
        let text = render_heatmap(&event, &heatmap);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("05/20(월)"));
        assert!(lines[1].starts_with("09:00") && lines[1].ends_with("2/2 L6"));
        assert!(lines[2].ends_with("0/2 L1"));
    }
}
