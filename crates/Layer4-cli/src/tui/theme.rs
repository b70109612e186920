//! Theme - 타임라인 TUI 색상 및 스타일 정의

use ratatui::style::{Color, Modifier, Style};

/// Vibepoints 테마
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// 전경색 (기본 텍스트)
    pub fg: Color,
    /// 뮤트된 텍스트 (보조 정보)
    pub muted: Color,
    /// 강조색 (브랜드 컬러)
    pub accent: Color,
    /// 성공
    pub success: Color,
    /// 경고
    pub warning: Color,
    /// 에러
    pub error: Color,
    /// 보더 색상
    pub border: Color,
    /// 선택된 항목 배경
    pub selection_bg: Color,
    /// 선택된 항목 전경
    pub selection_fg: Color,
    /// 방금 만들거나 되돌린 체크포인트 배경
    pub highlight_bg: Color,
}

impl Theme {
    /// 다크 테마 (기본)
    pub fn dark() -> Self {
        Self {
            fg: Color::Rgb(220, 220, 224),
            muted: Color::Rgb(128, 128, 140),
            accent: Color::Rgb(120, 180, 255),
            success: Color::Rgb(80, 200, 120),
            warning: Color::Rgb(255, 200, 80),
            error: Color::Rgb(255, 100, 100),
            border: Color::Rgb(60, 60, 70),
            selection_bg: Color::Rgb(50, 80, 120),
            selection_fg: Color::Rgb(255, 255, 255),
            highlight_bg: Color::Rgb(40, 90, 60),
        }
    }

    // === 스타일 헬퍼 메서드 ===

    /// 기본 텍스트 스타일
    pub fn text(&self) -> Style {
        Style::default().fg(self.fg)
    }

    /// 뮤트된 텍스트
    pub fn text_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// 강조 텍스트
    pub fn text_accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    /// 볼드 텍스트
    pub fn text_bold(&self) -> Style {
        Style::default().fg(self.fg).add_modifier(Modifier::BOLD)
    }

    /// 헤더 스타일
    pub fn header(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// 보더 스타일
    pub fn border(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// 보더 강조 스타일
    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.accent)
    }

    /// 선택된 항목
    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .fg(self.selection_fg)
    }

    /// 방금 만들거나 되돌린 체크포인트 행
    pub fn highlighted(&self) -> Style {
        Style::default()
            .bg(self.highlight_bg)
            .fg(self.selection_fg)
            .add_modifier(Modifier::BOLD)
    }

    /// 성공 메시지
    pub fn success(&self) -> Style {
        Style::default().fg(self.success)
    }

    /// 경고 메시지
    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    /// 에러 메시지
    pub fn error(&self) -> Style {
        Style::default().fg(self.error)
    }

    /// 키바인드 힌트
    pub fn keybind(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// 키바인드 설명
    pub fn keybind_desc(&self) -> Style {
        Style::default().fg(self.muted)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// 아이콘 상수
pub mod icons {
    pub const CHECK: &str = "✓";
    pub const CROSS: &str = "✗";
    pub const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];
    pub const PROMPT: &str = "❯";
    pub const WARNING: &str = "⚠";
    pub const BRANCH: &str = "⎇";
    pub const NEW: &str = "+";
}
