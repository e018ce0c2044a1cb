//! Relic Trail rendering, single screen.
//!
//! Layout: title + location cards | side panels (player, inventory, history)
//! + message log + help bar. The task dialog is drawn over the cards.
//! Loading and load-failure screens replace everything.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Local, Utc};
use ratzilla::ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratzilla::ratatui::Frame;

use crate::input::{is_narrow_layout, ClickState};
use crate::widgets::ClickableList;

use super::actions::*;
use super::engine::{DialogView, LocationView};
use super::save::{PlayerInfo, Storage};
use super::AdventureGame;

const TITLE: &str = " Relic Trail · 遗迹探险 ";
const HISTORY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Two info lines plus the borders.
const PLAYER_PANEL_HEIGHT: u16 = 4;

pub fn render<S: Storage>(
    game: &AdventureGame<S>,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let borders = borders_for(area.width);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(3),
        ])
        .split(area);

    render_title(f, chunks[0], borders);

    let cards_area = if is_narrow_layout(area.width) {
        render_narrow_body(game, f, chunks[1], borders, click_state)
    } else {
        render_wide_body(game, f, chunks[1], borders, click_state)
    };

    render_log(game, f, chunks[2], borders);
    render_help(game, f, chunks[3], borders, click_state);

    if let Some(dialog) = game.engine.pending(game.now_ms) {
        render_dialog(game, &dialog, f, cards_area, click_state);
    }
}

// ── Helpers ─────────────────────────────────────────────────

fn borders_for(area_width: u16) -> Borders {
    if is_narrow_layout(area_width) { Borders::TOP | Borders::BOTTOM } else { Borders::ALL }
}

/// Text bar in the style of an HP gauge; always `width` cells wide.
fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    "\u{2588}".repeat(filled) + &"\u{2591}".repeat(empty)
}

/// History is stored in UTC and shown in the player's local time zone.
fn history_time(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format(HISTORY_TIME_FORMAT)
        .to_string()
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

fn render_title(f: &mut Frame, area: Rect, borders: Borders) {
    let title = Paragraph::new(Line::from(Span::styled(
        TITLE,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(borders)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .alignment(Alignment::Center);
    f.render_widget(title, area);
}

// ── Body layouts ────────────────────────────────────────────

/// Returns the card area (dialogs are centered on it).
fn render_wide_body<S: Storage>(
    game: &AdventureGame<S>,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    click_state: &Rc<RefCell<ClickState>>,
) -> Rect {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(area);

    let inventory_h = game.engine.inventory().len().max(1) as u16 + 2;
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(PLAYER_PANEL_HEIGHT),
            Constraint::Length(inventory_h),
            Constraint::Min(3),
        ])
        .split(columns[1]);

    render_locations(game, f, columns[0], borders, click_state);
    render_player(game, f, side[0], borders);
    render_inventory(game, f, side[1], borders);
    render_history(game, f, side[2], borders);
    columns[0]
}

fn render_narrow_body<S: Storage>(
    game: &AdventureGame<S>,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    click_state: &Rc<RefCell<ClickState>>,
) -> Rect {
    let inventory_h = game.engine.inventory().len().max(1) as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(narrow_body_constraints(inventory_h))
        .split(area);

    render_locations(game, f, chunks[0], borders, click_state);
    render_player(game, f, chunks[1], borders);
    render_inventory(game, f, chunks[2], borders);
    render_history(game, f, chunks[3], borders);
    chunks[0]
}

/// Cards, player, inventory and history stacked top to bottom.
fn narrow_body_constraints(inventory_h: u16) -> [Constraint; 4] {
    [
        Constraint::Min(8),
        Constraint::Length(PLAYER_PANEL_HEIGHT),
        Constraint::Length(inventory_h),
        Constraint::Length(5),
    ]
}

// ── Location cards ──────────────────────────────────────────

fn render_locations<S: Storage>(
    game: &AdventureGame<S>,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let mut cl = ClickableList::new();
    for (index, view) in game.engine.locations().iter().enumerate() {
        push_card(&mut cl, index, view);
        cl.push(Line::from(""));
    }
    if cl.is_empty() {
        cl.push(Line::from(Span::styled(
            " 没有可探索的地点",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default()
        .borders(borders)
        .border_style(Style::default().fg(Color::Green))
        .title(" 地点（点击探索） ");
    let inner = block.inner(area);

    let mut cs = click_state.borrow_mut();
    cl.register_targets(area, &mut cs, inner.y - area.y, 1, 0, inner.width);
    drop(cs);

    f.render_widget(
        Paragraph::new(cl.into_lines()).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Every line of a card shares one action ID, so the whole card is a target.
fn push_card<'a>(cl: &mut ClickableList<'a>, index: usize, view: &LocationView<'a>) {
    let location = view.location;
    let accessible = location.is_accessible;
    let clickable = index < MAX_LOCATIONS as usize;

    let (key_style, name_style, text_style) = if accessible {
        (
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Gray),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    };

    let key = if clickable { format!(" [{}] ", index + 1) } else { " · ".to_string() };
    let mut header = vec![
        Span::styled(key, key_style),
        Span::styled(location.name.as_str(), name_style),
    ];
    if view.completed {
        header.push(Span::styled(" \u{2605}", Style::default().fg(Color::Yellow)));
    }

    let mut lines = vec![
        Line::from(header),
        Line::from(Span::styled(format!("     {}", location.description), text_style)),
        Line::from(Span::styled(
            format!("     {}", location.hint),
            text_style.add_modifier(Modifier::ITALIC),
        )),
    ];
    if accessible {
        lines.push(Line::from(Span::styled(
            format!("     \u{25b6} {}", location.task_hint),
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "     🔒 暂未解锁",
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(badge) = view.badge {
        lines.push(Line::from(Span::styled(
            format!("     ✅ {badge}"),
            Style::default().fg(Color::Green),
        )));
    }

    for line in lines {
        if clickable {
            cl.push_clickable(line, LOCATION_BASE + index as u16);
        } else {
            cl.push(line);
        }
    }
}

// ── Side panels ─────────────────────────────────────────────

fn render_player<S: Storage>(game: &AdventureGame<S>, f: &mut Frame, area: Rect, borders: Borders) {
    let block = Block::default()
        .borders(borders)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" 玩家 ");
    f.render_widget(Paragraph::new(player_lines(game.engine.player())).block(block), area);
}

fn player_lines(player: &PlayerInfo) -> Vec<Line<'_>> {
    vec![
        Line::from(vec![
            Span::styled(" ID: ", Style::default().fg(Color::DarkGray)),
            Span::styled(player.id.as_str(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled(" 昵称: ", Style::default().fg(Color::DarkGray)),
            Span::styled(player.nickname.as_str(), Style::default().fg(Color::White)),
        ]),
    ]
}

fn render_inventory<S: Storage>(
    game: &AdventureGame<S>,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
) {
    let ledger = game.engine.inventory();
    let lines: Vec<Line> = if ledger.is_empty() {
        vec![Line::from(Span::styled(
            " 背包是空的",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        ledger
            .iter()
            .map(|item| {
                Line::from(Span::styled(
                    format!(" \u{2022} {item}"),
                    Style::default().fg(Color::Magenta),
                ))
            })
            .collect()
    };

    let border_color = if game.now_ms < game.inventory_flash_until {
        Color::Yellow
    } else {
        Color::Magenta
    };
    let block = Block::default()
        .borders(borders)
        .border_style(Style::default().fg(border_color))
        .title(" 背包物品 ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_history<S: Storage>(game: &AdventureGame<S>, f: &mut Frame, area: Rect, borders: Borders) {
    let history = &game.engine.player().history;
    let max_lines = area.height.saturating_sub(2) as usize;
    let start = history.len().saturating_sub(max_lines);

    let lines: Vec<Line> = if history.is_empty() {
        vec![Line::from(Span::styled(
            " 还没有完成任何任务",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        history[start..]
            .iter()
            .map(|h| {
                Line::from(vec![
                    Span::styled(
                        format!(" {} - ", history_time(&h.timestamp)),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(h.action.as_str(), Style::default().fg(Color::White)),
                ])
            })
            .collect()
    };

    let block = Block::default()
        .borders(borders)
        .border_style(Style::default().fg(Color::Blue))
        .title(" 冒险记录 ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ── Log & help ──────────────────────────────────────────────

fn render_log<S: Storage>(game: &AdventureGame<S>, f: &mut Frame, area: Rect, borders: Borders) {
    let lines: Vec<Line> = game
        .log
        .iter()
        .map(|entry| {
            let style = if entry.is_important {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(format!(" > {}", entry.text), style))
        })
        .collect();

    let block = Block::default()
        .borders(borders)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    // Keep the newest line at the bottom after wrapping.
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    let total = paragraph.line_count(inner.width) as u16;
    let scroll = total.saturating_sub(inner.height);
    f.render_widget(paragraph.block(block).scroll((scroll, 0)), area);
}

fn render_help<S: Storage>(
    game: &AdventureGame<S>,
    f: &mut Frame,
    area: Rect,
    borders: Borders,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let shortcuts = game.engine.location_count().clamp(1, MAX_LOCATIONS as usize);
    let mut cl = ClickableList::new();
    match &game.notice {
        Some(notice) => cl.push(Line::from(Span::styled(
            format!(" {}", notice.text),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))),
        None => cl.push_clickable(
            Line::from(vec![
                Span::styled(
                    format!(" [1-{shortcuts}] "),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled("选择地点  ", Style::default().fg(Color::DarkGray)),
                Span::styled("[M] ", Style::default().fg(Color::Cyan)),
                Span::styled("音乐开关", Style::default().fg(Color::DarkGray)),
            ]),
            TOGGLE_MUSIC,
        ),
    }

    let block = Block::default()
        .borders(borders)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    let mut cs = click_state.borrow_mut();
    cl.register_targets(area, &mut cs, inner.y - area.y, 1, 0, 0);
    drop(cs);
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}

// ── Dialog ──────────────────────────────────────────────────

fn render_dialog<S: Storage>(
    game: &AdventureGame<S>,
    dialog: &DialogView<'_>,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let width = if is_narrow_layout(area.width) { area.width } else { area.width.min(56) };
    let inner_width = width.saturating_sub(2);
    let mut cl = ClickableList::new();

    let title = match dialog {
        DialogView::Puzzle {
            location,
            title,
            prompt,
            attempts,
        } => {
            cl.push(Line::from(Span::styled(
                format!(" {prompt}"),
                Style::default().fg(Color::White),
            )));
            cl.push(Line::from(""));
            cl.push(Line::from(vec![
                Span::styled(" > ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{}_", game.answer),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
            ]));
            if *attempts > 0 {
                cl.push(Line::from(Span::styled(
                    " 答案不正确，请重试！",
                    Style::default().fg(Color::Red),
                )));
            }
            cl.push(Line::from(""));
            cl.push_clickable(
                Line::from(Span::styled(
                    " [Enter] 提交",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
                SUBMIT_ANSWER,
            );
            cl.push_clickable(
                Line::from(Span::styled(
                    " [Backspace] 删除",
                    Style::default().fg(Color::DarkGray),
                )),
                ERASE_ANSWER,
            );
            format!(" {location} · {title} ")
        }
        DialogView::Progress {
            location,
            text,
            fraction,
        } => {
            let bar_width = inner_width.saturating_sub(8) as usize;
            cl.push(Line::from(Span::styled(
                format!(" {text}"),
                Style::default().fg(Color::White),
            )));
            cl.push(Line::from(""));
            cl.push(Line::from(vec![
                Span::styled(
                    format!(" {}", progress_bar(*fraction, bar_width)),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    format!(" {:>3}%", (fraction * 100.0).round() as u32),
                    Style::default().fg(Color::White),
                ),
            ]));
            format!(" {location} ")
        }
    };

    let height = cl.visual_height(inner_width) + 2;
    let dialog_area = centered(area, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));

    let mut cs = click_state.borrow_mut();
    cl.register_targets(dialog_area, &mut cs, 1, 1, 0, inner_width);
    drop(cs);

    f.render_widget(Clear, dialog_area);
    f.render_widget(
        Paragraph::new(cl.into_lines()).block(block).wrap(Wrap { trim: false }),
        dialog_area,
    );
}

// ── Loading / failure screens ───────────────────────────────

pub fn render_loading(f: &mut Frame, area: Rect) {
    let text = Paragraph::new(Line::from(Span::styled(
        "正在加载游戏数据...",
        Style::default().fg(Color::DarkGray),
    )))
    .block(Block::default().borders(borders_for(area.width)).title(TITLE))
    .alignment(Alignment::Center);
    f.render_widget(text, centered(area, area.width, 3));
}

pub fn render_load_error(
    f: &mut Frame,
    area: Rect,
    reason: &str,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let mut cl = ClickableList::new();
    cl.push(Line::from(Span::styled(
        format!(" 游戏加载失败: {reason}"),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )));
    cl.push(Line::from(""));
    cl.push_clickable(
        Line::from(Span::styled(
            " [R] 重试",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        RETRY_LOAD,
    );

    let width = area.width.min(64);
    let inner_width = width.saturating_sub(2);
    let height = cl.visual_height(inner_width) + 2;
    let error_area = centered(area, width, height);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(TITLE);

    let mut cs = click_state.borrow_mut();
    cl.register_targets(error_area, &mut cs, 1, 1, 0, inner_width);
    drop(cs);
    f.render_widget(
        Paragraph::new(cl.into_lines()).block(block).wrap(Wrap { trim: false }),
        error_area,
    );
}
