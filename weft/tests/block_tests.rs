//! Integration tests for the full block pipeline.
//!
//! These run content through the public API only: fragments are aggregated,
//! shaped by the cosmic-text surface, reconciled, and extracted back out.
//! Glyph geometry depends on the fonts installed on the host, so geometry
//! assertions stick to invariants (counts, identity, notification totals)
//! rather than pixel positions; extraction is surface-independent and is
//! asserted exactly.

#![cfg(feature = "cosmic")]

use weft::{
    AttachmentId, AttachmentRef, CosmicSurface, Fragment, Size, StyleDefaults, TextBlock,
    PLACEHOLDER,
};

fn init_logs() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

fn block() -> TextBlock<CosmicSurface> {
    init_logs();
    TextBlock::new(CosmicSurface::with_width(400.0), StyleDefaults::default())
}

fn mention(name: &str) -> AttachmentRef {
    AttachmentRef::named(name, Size::new(60.0, 16.0)).replacement_plain(format!("@{name}"))
}

#[test]
fn end_to_end_extraction_substitutes_replacements() {
    let mut block = block();
    block.rebuild(vec![
        Fragment::plain("Hello "),
        Fragment::widget(mention("nadia")),
        Fragment::plain("!"),
    ]);

    assert_eq!(block.extract_plain_all(), "Hello @nadia!");
    assert!(!block.extract_plain_all().contains(PLACEHOLDER));
    assert_eq!(block.extract_styled_all().to_plain(), "Hello @nadia!");
}

#[test]
fn buffer_carries_one_placeholder_per_widget() {
    let mut block = block();
    block.rebuild(vec![
        Fragment::widget(mention("a")),
        Fragment::plain(" and "),
        Fragment::widget(mention("b")),
    ]);

    let buffer = block.buffer();
    assert_eq!(buffer.placeholder_count(), 2);
    assert_eq!(
        buffer.text().chars().filter(|&c| c == PLACEHOLDER).count(),
        2
    );
    let ids: Vec<_> = buffer.placeholders().map(|(_, a)| a.id).collect();
    assert_eq!(ids, vec![mention("a").id, mention("b").id]);
}

#[test]
fn rebuild_preserves_state_for_surviving_identities() {
    let mut block = block();
    block.rebuild(vec![
        Fragment::plain("Hi "),
        Fragment::widget(mention("nadia")),
    ]);

    let state = block.registry().state(mention("nadia").id).unwrap();
    let origin = state.borrow().origin;
    let notifications = state.borrow().origin_notifications();

    // Same identity, same geometry: the record survives and the
    // unchanged-origin republish stays silent.
    block.rebuild(vec![
        Fragment::plain("Hi "),
        Fragment::widget(mention("nadia")),
    ]);

    let state = block.registry().state(mention("nadia").id).unwrap();
    assert_eq!(state.borrow().origin, origin);
    assert_eq!(state.borrow().origin_notifications(), notifications);
}

#[test]
fn rebuild_drops_omitted_identities() {
    let mut block = block();
    block.rebuild(vec![
        Fragment::widget(mention("keep")),
        Fragment::widget(mention("drop")),
    ]);
    assert_eq!(block.registry().len(), 2);

    block.rebuild(vec![Fragment::widget(mention("keep"))]);
    assert!(block.registry().contains(mention("keep").id));
    assert!(!block.registry().contains(mention("drop").id));
}

#[test]
fn unmapped_placeholder_never_reaches_extracted_text() {
    let mut block = block();
    block.rebuild(vec![
        Fragment::plain("a"),
        Fragment::widget(AttachmentRef::named("silent", Size::new(10.0, 10.0))),
        Fragment::plain("b"),
    ]);

    assert_eq!(block.extract_plain_all(), "ab");
    assert_eq!(block.extract_styled_all().to_plain(), "ab");
}

#[test]
fn selection_extraction_routes_through_substitution() {
    let mut block = block();
    block.rebuild(vec![
        Fragment::plain("Hello "),
        Fragment::widget(mention("nadia")),
        Fragment::plain("!"),
    ]);

    block.select_all();
    assert_eq!(
        block.extract_selection_plain().as_deref(),
        Some("Hello @nadia!")
    );

    // "lo " + widget
    block.select(3, 7);
    assert_eq!(block.extract_selection_plain().as_deref(), Some("lo @nadia"));
}

#[test]
fn size_reports_for_unknown_widgets_are_ignored() {
    let mut block = block();
    block.rebuild(vec![Fragment::plain("no widgets")]);

    // Must be inert, whatever the host races in with.
    block.update_widget_size(AttachmentId::named("ghost"), Size::new(1.0, 1.0));
    assert!(block.registry().is_empty());
}

#[cfg(feature = "markdown")]
#[test]
fn markdown_fragments_flow_through_the_pipeline() {
    let mut block = block();
    block.rebuild(vec![
        weft::markdown("**bold** and `code`"),
        Fragment::plain(" "),
        Fragment::widget(mention("nadia")),
    ]);

    assert_eq!(block.extract_plain_all(), "bold and code @nadia");
}
