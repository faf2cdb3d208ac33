//! Star counter composition as an FFmpeg filter graph.

use std::path::PathBuf;

use starvid_models::{StarData, Theme};

/// Frame width in pixels.
pub const WIDTH: u32 = 1280;
/// Frame height in pixels.
pub const HEIGHT: u32 = 720;
/// Frames per second.
pub const FPS: u32 = 60;
/// Counter animation length.
pub const ANIMATION_SECS: f64 = 3.0;
/// Hold on the final value after the animation.
pub const HOLD_SECS: f64 = 1.0;

/// A themed 1280x720 clip counting up to the repository's star total.
#[derive(Debug, Clone)]
pub struct Composition {
    pub title: String,
    pub stars: u64,
    pub stargazer_sample: usize,
    pub theme: Theme,
    pub font_file: Option<PathBuf>,
}

impl Composition {
    pub fn new(data: &StarData, theme: Theme) -> Self {
        Self {
            title: format!("{}/{}", data.user, data.repository),
            stars: data.stars,
            stargazer_sample: data.stargazers.len(),
            theme,
            font_file: None,
        }
    }

    pub fn with_font_file(mut self, font_file: Option<PathBuf>) -> Self {
        self.font_file = font_file;
        self
    }

    pub fn duration_secs() -> f64 {
        ANIMATION_SECS + HOLD_SECS
    }

    pub fn duration_ms() -> i64 {
        (Self::duration_secs() * 1000.0) as i64
    }

    /// Solid background source for `-f lavfi`.
    pub fn background_source(&self) -> String {
        format!(
            "color=c={}:s={}x{}:r={}:d={}",
            self.theme.background_color().replace('#', "0x"),
            WIDTH,
            HEIGHT,
            FPS,
            Self::duration_secs()
        )
    }

    /// `-vf` graph drawing the title, the animated counter and the footer.
    pub fn filter_graph(&self) -> String {
        let mut filters = vec![
            self.static_text(&self.title, 48, "h*0.22"),
            self.counter_text(),
            self.static_text("stars", 36, "h*0.64"),
        ];
        if self.stargazer_sample > 0 {
            let footer = format!("{} recent stargazers", self.stargazer_sample);
            filters.push(self.static_text(&footer, 24, "h*0.84"));
        }
        filters.join(",")
    }

    fn font_option(&self) -> String {
        match &self.font_file {
            Some(path) => format!("fontfile='{}':", escape_drawtext(&path.to_string_lossy())),
            None => String::new(),
        }
    }

    fn static_text(&self, text: &str, size: u32, y: &str) -> String {
        format!(
            "drawtext={}expansion=none:text='{}':fontcolor={}:fontsize={}:x=(w-text_w)/2:y={}",
            self.font_option(),
            escape_drawtext(text),
            self.theme.text_color(),
            size,
            y
        )
    }

    /// Ease-out cubic from 0 to `stars` over the animation, then hold.
    fn counter_text(&self) -> String {
        format!(
            "drawtext={}text='%{{eif\\:{}*(1-pow(1-min(t/{}\\,1)\\,3))\\:d}}':fontcolor={}:fontsize=120:x=(w-text_w)/2:y=(h-text_h)/2",
            self.font_option(),
            self.stars,
            ANIMATION_SECS,
            self.theme.text_color()
        )
    }
}

/// Escape a literal for a single-quoted drawtext option inside a filter graph.
///
/// Backslashes and colons are escaped for the option parser; a quote closes
/// the graph-level quoting, emits an escaped quote and reopens it.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            '\'' => out.push_str("'\\\\\\''"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(stars: u64, sample: usize) -> StarData {
        StarData {
            user: "octocat".into(),
            user_avatar_url: "https://a/o".into(),
            repository: "Hello-World".into(),
            stars,
            stargazers: (0..sample).map(|n| format!("https://a/{n}")).collect(),
            timeline: Vec::new(),
        }
    }

    #[test]
    fn test_background_follows_theme() {
        let dark = Composition::new(&data(5, 0), Theme::Dark);
        assert_eq!(dark.background_source(), "color=c=0x0a0a0a:s=1280x720:r=60:d=4");

        let light = Composition::new(&data(5, 0), Theme::Light);
        assert!(light.background_source().starts_with("color=c=0xffffff"));
        assert!(light.filter_graph().contains("fontcolor=black"));
    }

    #[test]
    fn test_counter_expression() {
        let graph = Composition::new(&data(1234, 3), Theme::Dark).filter_graph();
        assert!(graph.contains("text='octocat/Hello-World'"));
        assert!(graph.contains(r"%{eif\:1234*(1-pow(1-min(t/3\,1)\,3))\:d}"));
        assert!(graph.contains("3 recent stargazers"));
    }

    #[test]
    fn test_footer_omitted_without_stargazers() {
        let graph = Composition::new(&data(0, 0), Theme::Dark).filter_graph();
        assert!(!graph.contains("recent stargazers"));
        assert_eq!(Composition::duration_ms(), 4000);
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("a:b"), r"a\:b");
        assert_eq!(escape_drawtext(r"c:\fonts"), r"c\:\\fonts");
        assert_eq!(escape_drawtext("it's"), r"it'\\\''s");
        assert_eq!(escape_drawtext("octocat/Hello-World"), "octocat/Hello-World");
    }

    #[test]
    fn test_font_file_option() {
        let graph = Composition::new(&data(1, 0), Theme::Dark)
            .with_font_file(Some(PathBuf::from("/fonts/Inter.ttf")))
            .filter_graph();
        assert!(graph.starts_with("drawtext=fontfile='/fonts/Inter.ttf':"));
    }
}
