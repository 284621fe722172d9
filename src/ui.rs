//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{
    collections::BTreeMap,
    sync::LazyLock,
    time::{Duration, Instant},
};

use crate::app::App;
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::notification::NotificationView;

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("enter".to_string(), "play selected".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next".to_string());
    // H/L is filled dynamically from config.
    map.insert("s".to_string(), "shuffle".to_string());
    map.insert("1/2/3".to_string(), "notification buttons".to_string());
    map.insert("o".to_string(), "open now playing".to_string());
    map.insert("K".to_string(), "metadata".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "gg/G", "s", "1/2/3", "o", "K", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the mini-player time text (elapsed/total/remaining) per `UiSettings`.
///
/// A zero `total` means the duration is unknown; total and remaining are
/// then omitted.
fn now_playing_time_text(elapsed: Duration, total: Duration, ui: &UiSettings) -> Option<String> {
    let known = !total.is_zero();
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(elapsed)),
            TimeField::Total if known => Some(format_mmss(total)),
            TimeField::Remaining if known => {
                Some(format!("-{}", format_mmss(total.saturating_sub(elapsed))))
            }
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Status line of the mini-player.
fn status_text(app: &App, ui: &UiSettings, now: Instant) -> String {
    let mut parts: Vec<String> = Vec::new();

    match &app.now.current_track {
        Some(track) => {
            let song = if track.artist.is_empty() {
                track.title.clone()
            } else {
                format!("{} - {}", track.artist, track.title)
            };
            match now_playing_time_text(app.now.position, app.now.duration, ui) {
                Some(time) => parts.push(format!("Song: {} [{}]", song, time)),
                None => parts.push(format!("Song: {}", song)),
            }
            let state = if app.now.is_playing { "Playing" } else { "Paused" };
            parts.push(state.to_string());
        }
        None => parts.push("Stopped".to_string()),
    }

    parts.push(format!("Shuffle: {}", if app.shuffle { "ON" } else { "OFF" }));

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir));
    }

    if let Some(notice) = app.notice(now) {
        parts.push(format!("! {}", notice));
    }

    parts.join(" • ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format a duration rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Duration) -> String {
    if d.is_zero() {
        return "-".to_string();
    }

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    format!("{}:{:02} ({}s)", total_secs / 60, total_secs % 60, total_secs)
}

/// The persistent notification: title, artist and three numbered buttons.
fn notification_lines(view: &NotificationView) -> Vec<Line<'static>> {
    let mut title = vec![Span::styled(
        view.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if !view.text.is_empty() {
        title.push(Span::raw(format!("  {}", view.text)));
    }

    let buttons: Vec<Span<'static>> = view
        .actions
        .iter()
        .enumerate()
        .flat_map(|(i, a)| {
            let style = if i == 1 {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            [
                Span::styled(format!("[{}] {}", i + 1, a.label()), style),
                Span::raw("   "),
            ]
        })
        .collect();

    vec![Line::from(title), Line::from(buttons)]
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    notification: &NotificationView,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
    now: Instant,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" rondo ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_text(app, ui_settings, now))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" now playing "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Main list
    {
        let displayed = app.displayed();
        let playing = app.playing_position();

        // Only build ListItems for the visible window, centered on the selection.
        let total = displayed.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = displayed[start..end]
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let item = ListItem::new(track.display.as_str());
                if playing == Some(start + offset) {
                    item.bold()
                } else {
                    item
                }
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        let list_area = chunks[2];
        let popup_area = centered_rect_sized(72, 9, list_area);
        frame.render_widget(Clear, popup_area);

        let meta = match app.selected_track() {
            Some(track) => format!(
                "Title: {}\nArtist: {}\nDuration: {}\nPath: {}",
                track.title,
                track.artist,
                format_duration_mmss_ceil(track.duration),
                track.path.display()
            ),
            None => "No track selected".to_string(),
        };
        let meta_paragraph = Paragraph::new(meta)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    let notification_par = Paragraph::new(notification_lines(notification)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" notification (o opens) ")
            .padding(Padding {
                left: 1,
                right: 0,
                top: 0,
                bottom: 0,
            }),
    );
    frame.render_widget(notification_par, chunks[3]);

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fake::abc;
    use ratatui::{Terminal, backend::TestBackend};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn time_text_hides_unknown_totals() {
        let ui = UiSettings {
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total, TimeField::Remaining],
            ..UiSettings::default()
        };
        assert_eq!(
            now_playing_time_text(Duration::from_secs(65), Duration::from_secs(200), &ui).as_deref(),
            Some("01:05 / 03:20 / -02:15")
        );
        assert_eq!(
            now_playing_time_text(Duration::from_secs(65), Duration::ZERO, &ui).as_deref(),
            Some("01:05")
        );
    }

    #[test]
    fn controls_text_includes_scrub_step() {
        let text = controls_text(7);
        assert!(text.contains("[H/L] scrub -/+7s"));
        assert!(text.contains("[1/2/3] notification buttons"));
    }

    #[test]
    fn duration_rounds_partial_seconds_up() {
        assert_eq!(format_duration_mmss_ceil(Duration::from_millis(61_200)), "1:02 (62s)");
        assert_eq!(format_duration_mmss_ceil(Duration::ZERO), "-");
    }

    #[test]
    fn draw_renders_list_and_notification() {
        let mut app = App::new(abc());
        app.now.current_track = Some(abc()[1].clone());
        app.now.is_playing = true;
        let view = NotificationView::build(app.now.current_track.as_ref(), true);

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| {
                draw(
                    f,
                    &app,
                    &view,
                    &UiSettings::default(),
                    &ControlsSettings::default(),
                    Instant::now(),
                )
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("B Artist - B"));
        assert!(text.contains("[1] Prev"));
        assert!(text.contains("[2] Pause"));
        assert!(text.contains("[3] Next"));
    }
}
