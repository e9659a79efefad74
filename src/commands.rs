use crate::cli::{FetchArgs, SendArgs};
use hkex_filings::config::{AppConfig, MailConfig};
use hkex_filings::error::AppError;
use hkex_filings::workflows::digest::{
    format_email, DigestPayload, DigestPublisher, DigestStore, SavedDigest, DEFAULT_SOURCE,
};
use hkex_filings::workflows::filings::calendar::{hkt_now, previous_day};
use hkex_filings::workflows::filings::{ChromePageSource, FilingImporter};
use tracing::{info, warn};

pub(crate) fn run_fetch(config: &AppConfig, args: FetchArgs) -> Result<SavedDigest, AppError> {
    let FetchArgs {
        html,
        date,
        data_dir,
    } = args;

    let generated_at = hkt_now();
    let target_date = date.unwrap_or_else(|| previous_day(generated_at));
    let url = config.scrape.listing_url.as_str();

    let batch = match html {
        Some(path) => {
            info!(path = %path.display(), %target_date, "parsing saved listing page");
            FilingImporter::from_path(path, url, target_date)?
        }
        None => {
            let source = ChromePageSource::new(config.scrape.clone());
            FilingImporter::fetch(&source, url, target_date)?
        }
    };

    let payload = DigestPayload::build(batch, generated_at, DEFAULT_SOURCE);
    if let Some(message) = &payload.message {
        warn!(%message, "digest flagged");
    }

    let store = DigestStore::new(data_dir.as_ref().unwrap_or(&config.data_dir));
    let saved = store.save(&payload)?;

    println!(
        "Collected {} filing(s) posted {} (HKT)",
        payload.count, payload.target_date_hkt
    );
    println!("latest:  {}", saved.latest.display());
    println!("archive: {}", saved.archive.display());

    Ok(saved)
}

pub(crate) fn run_send(config: &AppConfig, args: SendArgs) -> Result<(), AppError> {
    let SendArgs { dry_run, data_dir } = args;

    let store = DigestStore::new(data_dir.as_ref().unwrap_or(&config.data_dir));
    let payload = store.load_latest()?;

    if dry_run {
        let content = format_email(&payload);
        println!("Subject: {}", content.subject);
        println!();
        println!("{}", content.body);
        return Ok(());
    }

    let mail = MailConfig::load()?;
    let publisher = DigestPublisher::smtp(&mail)?;
    let content = publisher.publish(&payload)?;
    println!(
        "Sent \"{}\" to {} recipient(s)",
        content.subject,
        mail.recipients.len()
    );

    Ok(())
}
