use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeBase {
	#[default]
	Light,
	Dark,
}

impl ThemeBase {
	pub fn as_str(self) -> &'static str {
		match self {
			ThemeBase::Light => "light",
			ThemeBase::Dark => "dark",
		}
	}
}

/// Theme fields as sent by the host; missing fields are derived from `base`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
	#[serde(default)]
	pub base: Option<ThemeBase>,
	#[serde(default)]
	pub secondary_background_color: Option<String>,
	#[serde(default)]
	pub text_color: Option<String>,
	#[serde(default)]
	pub primary_color: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
	pub base: ThemeBase,
	pub background_color: String,
	pub text_color: String,
	pub primary_color: String,
}

impl Default for Theme {
	fn default() -> Self {
		Self::for_base(ThemeBase::Light)
	}
}

impl Theme {
	pub fn for_base(base: ThemeBase) -> Self {
		let (background, text) = match base {
			ThemeBase::Light => ("#f0f2f6", "#31333f"),
			ThemeBase::Dark => ("#262730", "#fafafa"),
		};
		Self {
			base,
			background_color: background.into(),
			text_color: text.into(),
			primary_color: "#ff4b4b".into(),
		}
	}

	pub fn resolve(config: Option<&ThemeConfig>) -> Self {
		let Some(config) = config else {
			return Self::default();
		};
		let defaults = Self::for_base(config.base.unwrap_or_default());
		Self {
			background_color: config
				.secondary_background_color
				.clone()
				.unwrap_or(defaults.background_color),
			text_color: config.text_color.clone().unwrap_or(defaults.text_color),
			primary_color: config
				.primary_color
				.clone()
				.unwrap_or(defaults.primary_color),
			base: defaults.base,
		}
	}

	/// Border applied to the highlighted node.
	pub fn highlight_border(&self) -> String {
		format!("2px solid {}", self.primary_color)
	}

	pub fn node_fill(&self) -> &'static str {
		match self.base {
			ThemeBase::Light => "#ffffff",
			ThemeBase::Dark => "#1e1e1e",
		}
	}

	pub fn node_border(&self) -> &'static str {
		match self.base {
			ThemeBase::Light => "#1a192b",
			ThemeBase::Dark => "#3c3c3c",
		}
	}

	pub fn edge_stroke(&self) -> &'static str {
		match self.base {
			ThemeBase::Light => "#b1b1b7",
			ThemeBase::Dark => "#8c8c99",
		}
	}

	pub fn handle_fill(&self) -> &'static str {
		match self.base {
			ThemeBase::Light => "#1a192b",
			ThemeBase::Dark => "#e2e2e2",
		}
	}
}
