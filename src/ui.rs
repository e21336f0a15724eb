pub mod screen;

use quickdraw::{
    palette::{ActiveColor, Color as InkColor},
    round::{ColorWordRound, RevealStage, Round, ShuffleRound, TargetRound, CIRCLE_COUNT},
    GameSession, Outcome,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const BOARD_COLUMNS: usize = 5;

/// Keys for the circles, in board order
const CIRCLE_KEYS: &str = "abcdefghijklmnopqrst";

const GRADIENT: [Color; 4] = [
    Color::Magenta,
    Color::LightMagenta,
    Color::LightCyan,
    Color::Cyan,
];

pub fn circle_key(idx: usize) -> char {
    CIRCLE_KEYS.chars().nth(idx).unwrap_or('?')
}

/// Board position a key press stands for in the current round
pub fn key_to_index(round: &Round, c: char) -> Option<usize> {
    match round {
        Round::Target(_) => CIRCLE_KEYS
            .find(c.to_ascii_lowercase())
            .filter(|idx| *idx < CIRCLE_COUNT),
        Round::ColorWord(_) | Round::Reveal(_) => match c.to_digit(10) {
            Some(d) if d >= 1 => Some(d as usize - 1),
            _ => None,
        },
    }
}

pub fn ui(app: &App, f: &mut Frame) {
    screen::current_screen(app).render(app, f);
}

fn ink(color: InkColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

/// Readable label color on top of `color`
fn ink_contrast(color: InkColor) -> Color {
    match color {
        InkColor::Yellow | InkColor::Orange | InkColor::Green => Color::Black,
        _ => Color::White,
    }
}

fn active_fill(color: ActiveColor, elapsed_ms: i64) -> Color {
    match color {
        ActiveColor::Gradient => GRADIENT[(elapsed_ms.max(0) / 250) as usize % GRADIENT.len()],
        ActiveColor::Green => Color::Green,
        ActiveColor::Red => Color::Red,
        ActiveColor::Blue => Color::Blue,
        ActiveColor::Yellow => Color::Yellow,
        ActiveColor::Magenta => Color::Magenta,
    }
}

fn circle_glyph(size: f64) -> &'static str {
    match size {
        s if s >= 1.0 => "●",
        s if s >= 0.6 => "•",
        s if s >= 0.3 => "∙",
        _ => "·",
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// header / body / footer split used by every screen
fn frame_chunks(area: Rect, header: u16, footer: u16) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(header),
                Constraint::Min(3),
                Constraint::Length(footer),
            ]
            .as_ref(),
        )
        .split(area)
        .to_vec()
}

fn render_footer(f: &mut Frame, area: Rect, keys: &str) {
    let footer = Paragraph::new(keys)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(footer, area);
}

fn message_line(app: &App) -> Option<Line<'static>> {
    app.message
        .as_ref()
        .map(|m| Line::from(Span::styled(m.clone(), Style::default().fg(Color::Red))))
}

pub fn render_setup(app: &App, f: &mut Frame) {
    let session = &app.session;
    let game = session.game();
    let chunks = frame_chunks(f.area(), 4, 2);

    let header = Paragraph::new(vec![
        Line::from(Span::styled(game.title(), bold().fg(Color::Cyan))),
        Line::from(vec![
            Span::raw(format!(
                "{} <{}>",
                session.profile().name,
                session.profile().email
            )),
            Span::styled("  ·  personal best ", dim()),
            Span::styled(session.best().display(game), bold()),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, chunks[0]);

    let record = session.settings();
    let mut lines = vec![
        Line::from(Span::styled(
            game.instructions(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        Line::default(),
    ];
    for (idx, label) in record.field_labels().iter().enumerate() {
        let value = record.field_display(idx).unwrap_or_default();
        let selected = idx == app.selected_field;
        let value_style = if selected {
            bold().add_modifier(Modifier::REVERSED)
        } else {
            bold()
        };
        lines.push(Line::from(vec![
            Span::raw(if selected { "› " } else { "  " }),
            Span::styled(format!("{label:<18}"), dim()),
            Span::styled(format!(" {value} "), value_style),
        ]));
    }
    lines.push(Line::default());

    match record.validate() {
        Ok(_) => lines.push(Line::from(Span::styled(
            "press ENTER to start",
            bold().fg(Color::Green),
        ))),
        Err(e) => lines.push(Line::from(Span::styled(
            e.to_string(),
            Style::default().fg(Color::Yellow),
        ))),
    }
    lines.extend(message_line(app));

    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(body, chunks[1]);

    render_footer(
        f,
        chunks[2],
        "(↑/↓) field  (0-9 . ⌫) edit  (←/→) color  (tab) game  (l) leaderboard  (esc) quit",
    );
}

pub fn render_countdown(app: &App, f: &mut Frame) {
    let timer = app.session.timer();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN * 3)
        .constraints(
            [
                Constraint::Percentage(35),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(f.area());

    let title = Paragraph::new(vec![
        Line::from(Span::styled("Get ready", bold().fg(Color::Yellow))),
        Line::from(Span::styled(app.session.game().title(), dim())),
    ])
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[1]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Yellow))
        .ratio(timer.progress())
        .label(format!("{} s", timer.display()));
    f.render_widget(gauge, chunks[2]);
}

fn status_line(session: &GameSession, outcome: Outcome) -> Line<'static> {
    let mut spans = vec![
        Span::styled("score ", dim()),
        Span::styled(session.score().to_string(), bold().fg(Color::Green)),
    ];
    if session.game().counts_errors() {
        spans.push(Span::styled("   errors ", dim()));
        spans.push(Span::styled(
            session.error_count().to_string(),
            bold().fg(Color::Red),
        ));
    }
    if let Some(rounds) = session.round_count() {
        spans.push(Span::styled("   round ", dim()));
        spans.push(Span::styled(
            format!("{}/{}", session.round_index(), rounds),
            bold(),
        ));
    }
    match outcome {
        Outcome::Hit => spans.push(Span::styled("   ✓", bold().fg(Color::Green))),
        Outcome::Miss => spans.push(Span::styled("   ✗", bold().fg(Color::Red))),
        _ => {}
    }
    Line::from(spans)
}

fn target_board(round: &TargetRound, round_elapsed_ms: i64) -> Vec<Line<'static>> {
    let size = round.size_fraction(round_elapsed_ms);
    let fill = active_fill(round.color, round_elapsed_ms);

    let mut lines = Vec::new();
    for row_start in (0..CIRCLE_COUNT).step_by(BOARD_COLUMNS) {
        let mut spans = Vec::new();
        for idx in row_start..(row_start + BOARD_COLUMNS).min(CIRCLE_COUNT) {
            spans.push(Span::styled(format!("  {} ", circle_key(idx)), dim()));
            if round.is_active(idx) {
                spans.push(Span::styled(circle_glyph(size), bold().fg(fill)));
            } else {
                spans.push(Span::styled("○", dim()));
            }
            spans.push(Span::raw("  "));
        }
        lines.push(Line::from(spans));
        lines.push(Line::default());
    }
    lines
}

fn color_word_board(round: &ColorWordRound) -> Vec<Line<'static>> {
    let word = Line::from(Span::styled(
        round.label_color.name(),
        bold().fg(ink(round.correct_color)),
    ));

    let mut buttons = Vec::new();
    for (idx, color) in round.buttons.iter().enumerate() {
        buttons.push(Span::styled(
            format!("   {}   ", idx + 1),
            bold().bg(ink(*color)).fg(ink_contrast(*color)),
        ));
        buttons.push(Span::raw("  "));
    }

    vec![
        word,
        Line::default(),
        Line::default(),
        Line::from(buttons),
    ]
}

fn reveal_board(round: &ShuffleRound) -> Vec<Line<'static>> {
    let mut cards = Vec::new();
    let mut keys = Vec::new();
    for (idx, card) in round.cards.iter().enumerate() {
        let face = match (round.face_up(), card.is_correct) {
            (true, true) => Span::styled("[ ★ ]", bold().fg(Color::Yellow)),
            (true, false) => Span::styled("[   ]", bold()),
            (false, _) => Span::styled("[▒▒▒]", Style::default().fg(Color::Blue)),
        };
        cards.push(face);
        cards.push(Span::raw("  "));
        keys.push(Span::styled(format!("  {}  ", idx + 1), dim()));
        keys.push(Span::raw("  "));
    }

    let hint = match round.stage {
        RevealStage::Revealed => Span::styled(
            "remember the ★ card, then press SPACE to shuffle",
            Style::default().fg(Color::Yellow),
        ),
        RevealStage::Shuffling { done } => Span::styled(
            format!("shuffling {done}/{}", round.shuffle_count),
            Style::default().fg(Color::Cyan),
        ),
        RevealStage::Choosing => Span::styled(
            format!("pick a card (1-{})", round.cards.len()),
            bold(),
        ),
        RevealStage::Resolved { correct: true, .. } => Span::styled(
            "correct! press ENTER for the next round",
            bold().fg(Color::Green),
        ),
        RevealStage::Resolved { correct: false, .. } => Span::styled(
            "wrong card, press ENTER for the next round",
            bold().fg(Color::Red),
        ),
    };

    vec![
        Line::from(cards),
        Line::from(keys),
        Line::default(),
        Line::from(hint),
    ]
}

pub fn render_play(app: &App, f: &mut Frame) {
    let session = &app.session;
    let chunks = frame_chunks(f.area(), 4, 2);

    let header_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3)].as_ref())
        .split(chunks[0]);

    let status =
        Paragraph::new(status_line(session, app.last_outcome)).alignment(Alignment::Center);
    f.render_widget(status, header_chunks[0]);

    let timer = session.timer();
    if timer.is_running() {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(timer.progress())
            .label(format!("{} s", timer.display()));
        f.render_widget(gauge, header_chunks[1]);
    }

    let board = match session.round() {
        Some(Round::Target(round)) => target_board(round, session.round_elapsed_ms()),
        Some(Round::ColorWord(round)) => color_word_board(round),
        Some(Round::Reveal(round)) => reveal_board(round),
        None => Vec::new(),
    };
    let mut lines = vec![Line::default()];
    lines.extend(board);
    lines.extend(message_line(app));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), chunks[1]);

    let keys = match session.round() {
        Some(Round::Target(_)) => "(a-t) hit circle  (esc) end",
        Some(Round::ColorWord(_)) => "(1-5) pick color  (esc) end",
        _ => "(space) shuffle  (1-9) pick card  (enter) next round  (esc) end",
    };
    render_footer(f, chunks[2], keys);
}

pub fn render_summary(app: &App, f: &mut Frame) {
    let session = &app.session;
    let game = session.game();
    let chunks = frame_chunks(f.area(), 2, 2);

    let title = Paragraph::new(Line::from(Span::styled(
        format!("{} finished", game.title()),
        bold().fg(Color::Cyan),
    )))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let mut lines = Vec::new();
    if let Some(metric) = session.metric() {
        lines.push(Line::from(vec![
            Span::styled("score  ", dim()),
            Span::styled(metric.score.to_string(), bold().fg(Color::Green)),
        ]));
        if game.counts_errors() {
            lines.push(Line::from(vec![
                Span::styled("errors  ", dim()),
                Span::styled(metric.error_count.to_string(), bold().fg(Color::Red)),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{}  ", game.derived_label().to_lowercase()), dim()),
            Span::styled(metric.derived_display(), bold().fg(Color::Yellow)),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled("personal best  ", dim()),
        Span::styled(session.best().display(game), bold()),
    ]));
    lines.extend(message_line(app));

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), chunks[1]);
    render_footer(
        f,
        chunks[2],
        "(enter/r) play again  (b) back to settings  (l) leaderboard  (esc) quit",
    );
}

pub fn render_leaderboard(app: &App, f: &mut Frame) {
    let game = app.leaderboard_game;
    let chunks = frame_chunks(f.area(), 2, 2);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(format!("{} leaderboard", game.title()), bold().fg(Color::Cyan)),
        Span::styled(format!("  ({})", game.derived_label().to_lowercase()), dim()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if app.leaderboard.is_empty() {
        let mut lines = vec![Line::from(Span::styled(
            "No results yet. Play a round to get on the board.",
            Style::default().fg(Color::Gray),
        ))];
        lines.extend(message_line(app));
        f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), chunks[1]);
    } else {
        let header = Row::new(vec![
            Cell::from("#"),
            Cell::from("Player"),
            Cell::from(format!("Best ({})", game.derived_unit())),
            Cell::from("Mean"),
            Cell::from("Sessions"),
            Cell::from("Last Played"),
        ])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = app
            .leaderboard
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                let style = if entry.player_id == app.session.profile().id {
                    bold().fg(Color::Green)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from((rank + 1).to_string()),
                    Cell::from(entry.player_id.clone()),
                    Cell::from(format!("{:.2}", entry.best)),
                    Cell::from(format!("{:.2}", entry.mean)),
                    Cell::from(entry.sessions.to_string()),
                    Cell::from(entry.last_played.format("%Y-%m-%d %H:%M").to_string()),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(16),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL))
            .column_spacing(2);
        f.render_widget(table, chunks[1]);
    }

    render_footer(f, chunks[2], "(tab) next game  (b/esc) back");
}
