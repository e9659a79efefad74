use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{NaiveDate, TimeZone};
use hkex_filings::config::DEFAULT_LISTING_URL;
use hkex_filings::workflows::digest::{
    DigestPayload, DigestPublisher, DigestStore, MailError, MailGateway, OutgoingMail,
    StoreError, DEFAULT_SOURCE,
};
use hkex_filings::workflows::filings::calendar::hkt;
use hkex_filings::workflows::filings::FilingImporter;

#[derive(Debug, Default)]
struct FakeMailGateway {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MailGateway for FakeMailGateway {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let mut guard = self.sent.lock().expect("mail mutex");
        guard.push(mail.clone());
        Ok(())
    }
}

#[derive(Debug)]
struct RejectingMailGateway;

impl MailGateway for RejectingMailGateway {
    fn send(&self, _mail: &OutgoingMail) -> Result<(), MailError> {
        Err(MailError::NoRecipients)
    }
}

/// Shares the fake with the test after the publisher takes ownership.
#[derive(Debug)]
struct SharedGateway(std::sync::Arc<FakeMailGateway>);

impl MailGateway for SharedGateway {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.0.send(mail)
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hkex-filings-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn fixture_payload() -> DigestPayload {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("appindex.html");
    let target = NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid target date");
    let batch =
        FilingImporter::from_path(fixture, DEFAULT_LISTING_URL, target).expect("fixture loads");
    let generated_at = hkt()
        .with_ymd_and_hms(2026, 10, 18, 9, 5, 0)
        .single()
        .expect("valid instant");
    DigestPayload::build(batch, generated_at, DEFAULT_SOURCE)
}

#[test]
fn saved_digest_round_trips_through_latest_and_archive() {
    let dir = scratch_dir("roundtrip");
    let store = DigestStore::new(&dir);
    let payload = fixture_payload();

    let saved = store.save(&payload).expect("digest saved");
    assert_eq!(saved.latest, dir.join("latest.json"));
    assert_eq!(saved.archive, dir.join("archive").join("2026-10-17.json"));

    let latest = std::fs::read_to_string(&saved.latest).expect("latest readable");
    let archive = std::fs::read_to_string(&saved.archive).expect("archive readable");
    assert_eq!(latest, archive);
    assert!(latest.contains("深圳甲乙科技股份有限公司"));
    assert!(latest.contains("\"generated_at_hkt\": \"2026-10-18T09:05:00+08:00\""));

    let loaded = store.load_latest().expect("latest loads");
    assert_eq!(loaded, payload);
    assert_eq!(loaded.count, 3);

    std::fs::remove_dir_all(&dir).expect("cleanup scratch dir");
}

#[test]
fn publisher_sends_formatted_digest_to_all_recipients() {
    let gateway = std::sync::Arc::new(FakeMailGateway::default());
    let publisher = DigestPublisher::new(
        Box::new(SharedGateway(gateway.clone())),
        "bot@example.com".to_string(),
        vec!["a@example.com".to_string(), "b@example.com".to_string()],
    );

    let content = publisher.publish(&fixture_payload()).expect("digest published");
    assert_eq!(content.subject, "[HKEX AP] 2026-10-17 新增 3 家");

    let sent = gateway.sent.lock().expect("mail mutex");
    assert_eq!(sent.len(), 1);
    let mail = &sent[0];
    assert_eq!(mail.from, "bot@example.com");
    assert_eq!(mail.to, vec!["a@example.com", "b@example.com"]);
    assert_eq!(mail.subject, content.subject);
    assert!(mail.body.contains("1. Alpha Holdings Limited"));
    assert!(mail.body.contains("2. 深圳甲乙科技股份有限公司"));
    assert!(mail.body.contains("3. Beta Group Ltd.\n   - 日期: 2026-10-17\n   - 类型: PHIP\n   - 板块: GEM"));
    assert!(mail.body.ends_with("DocTypeDist: AP=2, PHIP=1"));
}

#[test]
fn gateway_failures_propagate() {
    let publisher = DigestPublisher::new(
        Box::new(RejectingMailGateway),
        "bot@example.com".to_string(),
        Vec::new(),
    );
    let err = publisher
        .publish(&fixture_payload())
        .expect_err("delivery fails");
    assert!(matches!(err, MailError::NoRecipients));
}

#[test]
fn missing_latest_digest_is_reported() {
    let dir = scratch_dir("missing");
    let store = DigestStore::new(&dir);
    match store.load_latest() {
        Err(StoreError::MissingLatest(path)) => assert_eq!(path, dir.join("latest.json")),
        other => panic!("expected missing latest error, got {other:?}"),
    }
}
