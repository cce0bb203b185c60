// tests/feed_fixture.rs
use nodvarsel_monitor::feed::{parser::parse_feed, snapshot::build};

const FEED_XML: &str = include_str!("fixtures/nodvarsel_rss.xml");

#[test]
fn fixture_parses_into_ordered_records() {
    let records = parse_feed(FEED_XML).expect("fixture parses");
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first.guid, "nv-2025-0312-01");
    assert_eq!(first.title, "Ekstremværet Ingunn: Fare for stormflo i Trøndelag");
    assert!(first.description.starts_with("Politiet ber beboere"));
    assert!(first.description.contains("<a href=\"https://www.politiet.no\">"));
    assert_eq!(first.updated, "2025-03-12T18:41:00+01:00");

    let second = &records[1];
    assert_eq!(second.title, "Skogbrann i Sokndal & Lund");
    assert_eq!(second.updated, "2025-03-12T16:05:00+01:00");

    let bare = &records[2];
    assert_eq!(bare.title, "Test av nødvarsel");
    assert_eq!(bare.guid, "");
    assert_eq!(bare.link, "");
    assert_eq!(bare.description, "");
    assert_eq!(bare.updated, "");
}

#[test]
fn fixture_snapshot_summarizes_feed() {
    let snap = build(parse_feed(FEED_XML).unwrap());
    assert_eq!(snap.alert_count, 3);
    assert!(snap.has_active_alert);
    assert_eq!(snap.last_alert.as_ref(), snap.alerts.first());
    assert_eq!(
        snap.last_alert.unwrap().link,
        "https://www.nodvarsel.no/varsler/nv-2025-0312-01/"
    );
}

#[test]
fn channel_level_atom_link_is_not_an_item() {
    // <atom:link/> and channel metadata must not leak into the records
    let records = parse_feed(FEED_XML).unwrap();
    assert!(records.iter().all(|r| !r.title.contains("aktive nødvarsler")));
}
