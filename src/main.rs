mod app;
mod appsettings;
mod medicine;
mod scheduling;
mod settings;
mod speech;
mod storage;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{AppSender, ReminderApp};
use crate::medicine::NewMedicine;
use crate::settings::{Language, VoiceGender};
use crate::speech::LoggingSpeechService;
use crate::storage::{FileKvStore, StateStore};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    pretty_env_logger::init();

    let settings = appsettings::get();
    log::info!(
        "Starting. [data_dir = {}, poll = {:?}]",
        settings.storage.data_dir,
        settings.scheduler.poll_interval()
    );

    let store = StateStore::new(FileKvStore::new(&settings.storage.data_dir));
    let speech = Arc::new(LoggingSpeechService);
    let app = ReminderApp::start(store, speech, settings.scheduler.repeat_interval()).await;

    let poller = scheduling::poller::start(settings.scheduler.poll_interval(), app.sender());

    run_command_loop(app.sender()).await?;

    poller.cancel(SHUTDOWN_TIMEOUT).await;
    app.shutdown().await;
    Ok(())
}

/// Minimal line-oriented surface standing in for the presentation layer.
/// Everything it does goes through the same [`AppSender`] API the poller
/// uses.
async fn run_command_loop(sender: AppSender) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };

        let result = match command {
            "list" => list_medicines(&sender).await,
            "active" => show_active_alert(&sender).await,
            "add" => add_medicine(&sender, parts.collect::<Vec<_>>()).await,
            "take" => with_id(parts.next(), |id| sender.mark_taken(id)).await,
            "snooze" => with_id(parts.next(), |id| sender.snooze(id)).await,
            "lang" => set_language(&sender, parts.next()).await,
            "voice" => set_voice(&sender, parts.next()).await,
            "snoozemin" => set_snooze_minutes(&sender, parts.next()).await,
            "quit" | "exit" => break,
            _ => {
                print_help();
                Ok(())
            }
        };

        if let Err(error) = result {
            println!("error: {error:#}");
        }
    }

    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  list | active");
    println!("  add <kind> <HH:MM> <dosage...>");
    println!("  take <id> | snooze <id>");
    println!("  lang <en|te> | voice <male|female> | snoozemin <n>");
    println!("  quit");
}

async fn list_medicines(sender: &AppSender) -> anyhow::Result<()> {
    let medicines = sender.list_medicines().await?;
    if medicines.is_empty() {
        println!("no medicines added yet");
        return Ok(());
    }

    let now = Local::now().naive_local();
    for med in medicines {
        let status = if med.is_expired(now) {
            "finished"
        } else if med.taken_today {
            "done"
        } else {
            "pending"
        };
        let ordinal = med
            .kind
            .ordinal()
            .map_or_else(|| "?".to_string(), |n| n.to_string());
        println!(
            "#{} ({}) {} at {} ({}) day {}/{} [{}]",
            med.id,
            ordinal,
            med.kind,
            med.time,
            med.dosage,
            med.day_number(now).min(med.duration_days),
            med.duration_days,
            status
        );
    }
    Ok(())
}

async fn show_active_alert(sender: &AppSender) -> anyhow::Result<()> {
    match sender.active_alert().await? {
        Some(alert) => println!(
            "ringing: #{} {} (since {})",
            alert.medicine.id,
            alert.medicine.kind,
            alert.triggered_at.format("%H:%M:%S")
        ),
        None => println!("no active alert"),
    }
    Ok(())
}

async fn add_medicine(sender: &AppSender, args: Vec<&str>) -> anyhow::Result<()> {
    let [kind, time, dosage @ ..] = args.as_slice() else {
        anyhow::bail!("usage: add <kind> <HH:MM> <dosage...>");
    };
    let new = NewMedicine {
        kind: kind.parse()?,
        time: time.parse()?,
        dosage: if dosage.is_empty() {
            "1 drop".to_string()
        } else {
            dosage.join(" ")
        },
    };
    let created = sender.add_medicine(new).await?;
    println!("added #{} {} at {}", created.id, created.kind, created.time);
    Ok(())
}

async fn with_id<F, Fut>(raw: Option<&str>, action: F) -> anyhow::Result<()>
where
    F: FnOnce(medicine::MedicineId) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let id = raw
        .ok_or_else(|| anyhow::anyhow!("missing medicine id"))?
        .parse()?;
    action(id).await
}

async fn set_language(sender: &AppSender, raw: Option<&str>) -> anyhow::Result<()> {
    let language = match raw {
        Some("en") => Language::En,
        Some("te") => Language::Te,
        _ => anyhow::bail!("usage: lang <en|te>"),
    };
    let mut settings = sender.settings().await?;
    settings.language = language;
    sender.update_settings(settings).await
}

async fn set_voice(sender: &AppSender, raw: Option<&str>) -> anyhow::Result<()> {
    let voice_gender = match raw {
        Some("male") => VoiceGender::Male,
        Some("female") => VoiceGender::Female,
        _ => anyhow::bail!("usage: voice <male|female>"),
    };
    let mut settings = sender.settings().await?;
    settings.voice_gender = voice_gender;
    sender.update_settings(settings).await
}

async fn set_snooze_minutes(sender: &AppSender, raw: Option<&str>) -> anyhow::Result<()> {
    let minutes: u32 = raw
        .ok_or_else(|| anyhow::anyhow!("usage: snoozemin <n>"))?
        .parse()?;
    anyhow::ensure!(minutes > 0, "snooze must be at least one minute");
    let mut settings = sender.settings().await?;
    settings.snooze_minutes = minutes;
    sender.update_settings(settings).await
}
