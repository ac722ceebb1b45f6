use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, InputField, VimMode};
use crate::nav::Route;
use crate::profile::{ProfileCard, ProfileState, ProfileTab};
use crate::toast::ToastKind;

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const ACCENT: Color = Color::Green;

pub fn draw(f: &mut Frame, app: &App) {
    match app.route {
        Route::Login => draw_login(f, app),
        Route::Profile => draw_profile(f, app),
        Route::Explore => draw_placeholder(f, " Explorer ", "La page d'accueil n'est pas disponible dans ce client."),
        Route::EditProfile => draw_placeholder(
            f,
            " Modifier le profil ",
            "La modification du profil n'est pas disponible dans ce client.",
        ),
    }

    // Draw error overlay if present
    if let Some(ref error) = app.error_message {
        draw_error_popup(f, error);
    }

    // Draw loading overlay if loading
    if app.loading {
        draw_loading_overlay(f, &app.loading_message);
    }

    draw_toasts(f, app);
}

fn draw_login(f: &mut Frame, app: &App) {
    let area = f.area();

    // Center the login form
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(12),
            Constraint::Percentage(25),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(vertical[1]);

    let form_area = horizontal[1];

    let form_block = Block::default()
        .title(" Connexion ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let inner = form_block.inner(form_area);
    f.render_widget(form_block, form_area);

    let form_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(2), // Submit hint
            Constraint::Min(0),
        ])
        .split(inner);

    let field_style = |field: InputField| {
        if app.login_field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        }
    };

    let email_block = Block::default()
        .title(" Email ")
        .borders(Borders::ALL)
        .border_style(field_style(InputField::Email));
    f.render_widget(
        Paragraph::new(app.login_email.as_str()).block(email_block),
        form_chunks[0],
    );

    let password_block = Block::default()
        .title(" Mot de passe ")
        .borders(Borders::ALL)
        .border_style(field_style(InputField::Password));
    let password_display = "*".repeat(app.login_password.chars().count());
    f.render_widget(
        Paragraph::new(password_display).block(password_block),
        form_chunks[1],
    );

    let mode_text = match app.vim_mode {
        VimMode::Normal => "'i' saisir | Entrée valider | 'q' quitter",
        VimMode::Insert => "Saisie | Échap normal | Entrée valider",
    };
    let hint = Paragraph::new(mode_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint, form_chunks[2]);

    // Set cursor position in insert mode
    if app.vim_mode == VimMode::Insert {
        let (chunk, len) = match app.login_field {
            InputField::Email => (form_chunks[0], app.login_email.chars().count()),
            InputField::Password => (form_chunks[1], app.login_password.chars().count()),
        };
        let offset = len.min(u16::MAX as usize) as u16;
        let x = chunk.x.saturating_add(1).saturating_add(offset);
        f.set_cursor_position((x.min(chunk.right().saturating_sub(1)), chunk.y + 1));
    }
}

fn draw_profile(f: &mut Frame, app: &App) {
    match app.profile.state() {
        ProfileState::Loading => {
            let frame = SPINNER[app.spinner_frame % SPINNER.len()];
            draw_loading(f, frame);
        }
        ProfileState::Failed => draw_profile_error(f),
        ProfileState::Loaded(profile) => {
            let card = ProfileCard::new(profile);
            draw_profile_page(f, app, &card);
        }
    }
}

fn draw_profile_error(f: &mut Frame) {
    let area = centered_rect(60, 30, f.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = vec![
        Line::from(Span::styled(
            "Erreur",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Impossible de charger votre profil. Veuillez réessayer."),
        Line::from(""),
        Line::from(Span::styled(
            "[Entrée] Retour à la connexion",
            Style::default().fg(ACCENT),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(paragraph, area);
}

fn draw_profile_page(f: &mut Frame, app: &App, card: &ProfileCard) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Back link
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let back = Paragraph::new(Span::styled(
        "← Revenir à la page d'accueil",
        Style::default().fg(Color::Gray),
    ));
    f.render_widget(back, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
        .split(chunks[1]);

    draw_profile_card(f, columns[0], card);
    draw_profile_tabs(f, columns[1], app, card);
    draw_profile_status_bar(f, chunks[2]);

    if let Some(draft) = app.avatar.draft() {
        draw_avatar_popup(f, draft);
    }
}

fn draw_profile_card(f: &mut Frame, area: Rect, card: &ProfileCard) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let muted = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("[{}]", card.avatar.unwrap_or("pas de photo")),
            muted,
        )),
        Line::from(""),
        Line::from(Span::styled(
            card.display_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    if let Some(location) = card.location {
        lines.push(Line::from(vec![
            Span::styled("⌖ ", Style::default().fg(ACCENT)),
            Span::raw(location),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("[e] Modifier le profil", muted)));
    lines.push(Line::from("─".repeat(area.width.saturating_sub(2) as usize)));

    lines.push(Line::from(vec![Span::styled("✉ ", muted), Span::raw(card.email)]));
    if let Some(phone) = card.phone {
        lines.push(Line::from(vec![Span::styled("☎ ", muted), Span::raw(phone)]));
    }
    lines.push(Line::from(card.member_since.clone()));
    lines.push(Line::from(vec![
        Span::styled("ID utilisateur : ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(card.user_id),
    ]));

    lines.push(Line::from("─".repeat(area.width.saturating_sub(2) as usize)));
    lines.push(Line::from(Span::styled(
        "[L] Déconnexion",
        Style::default().fg(Color::Red),
    )));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}

fn draw_profile_tabs(f: &mut Frame, area: Rect, app: &App, card: &ProfileCard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let active = app.profile.active_tab();
    let selected = ProfileTab::ALL
        .iter()
        .position(|tab| *tab == active)
        .unwrap_or(0);

    let tabs = Tabs::new(ProfileTab::ALL.iter().map(|tab| tab.title()))
        .select(selected)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    let (title, body) = match active {
        ProfileTab::Info => (" À propos de moi ", card.about),
        ProfileTab::Favorites | ProfileTab::Activities => (" Bientôt disponible ", ""),
    };

    let panel = Paragraph::new(body)
        .wrap(Wrap { trim: true })
        .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(panel, chunks[1]);
}

fn draw_profile_status_bar(f: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" PROFIL ", Style::default().bg(ACCENT).fg(Color::Black)),
        Span::raw(" "),
        Span::styled(
            "h: accueil | e: modifier | a: photo | Tab/1-3: onglets | L: déconnexion | q: quitter",
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    f.render_widget(status, area);
}

fn draw_avatar_popup(f: &mut Frame, draft: &str) {
    let area = centered_rect(60, 20, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Photo de profil (URL) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let text = vec![
        Line::from(draft),
        Line::from(""),
        Line::from(Span::styled(
            "Entrée valider | Échap annuler",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_placeholder(f: &mut Frame, title: &str, message: &str) {
    let area = f.area();

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));
    f.render_widget(block, area);

    let text = vec![
        Line::from(message),
        Line::from(""),
        Line::from(Span::styled(
            "Retour arrière : revenir au profil | q : quitter",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    f.render_widget(paragraph, centered_rect(80, 30, area));
}

fn draw_loading(f: &mut Frame, message: &str) {
    let area = f.area();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    f.render_widget(block, area);

    let text = Paragraph::new(message)
        .style(Style::default().fg(ACCENT))
        .alignment(Alignment::Center);

    let center = centered_rect(50, 20, area);
    f.render_widget(text, center);
}

fn draw_loading_overlay(f: &mut Frame, message: &str) {
    let area = centered_rect(40, 10, f.area());

    f.render_widget(Clear, area);

    let text = Paragraph::new(message)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(text, area);
}

fn draw_error_popup(f: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Erreur ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = Paragraph::new(error)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);

    f.render_widget(text, area);
}

/// Stack toasts in the top-right corner, newest at the bottom
fn draw_toasts(f: &mut Frame, app: &App) {
    let area = f.area();
    let width = (area.width / 3).max(20).min(area.width);

    for (i, toast) in app.toasts.iter().enumerate() {
        let y = area.y + 1 + (i as u16) * 3;
        if y + 3 > area.bottom() {
            break;
        }
        let rect = Rect::new(area.right() - width, y, width, 3);

        let color = match toast.kind {
            ToastKind::Success => ACCENT,
            ToastKind::Error => Color::Red,
        };

        f.render_widget(Clear, rect);
        let paragraph = Paragraph::new(toast.message.as_str())
            .style(Style::default().fg(color))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );
        f.render_widget(paragraph, rect);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
