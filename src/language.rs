use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transcript language forwarded to the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LanguageCode {
  #[default]
  #[serde(rename = "en")]
  En,
  #[serde(rename = "zh")]
  Zh,
  #[serde(rename = "hi")]
  Hi,
  #[serde(rename = "es")]
  Es,
  #[serde(rename = "fr")]
  Fr,
  #[serde(rename = "ar")]
  Ar,
  #[serde(rename = "bn")]
  Bn,
  /// Portuguese. The analysis service expects `pr`; `pt` is accepted on input.
  #[serde(rename = "pr", alias = "pt")]
  Pt,
  #[serde(rename = "ru")]
  Ru,
  #[serde(rename = "ur")]
  Ur,
}

impl LanguageCode {
  pub const ALL: [LanguageCode; 10] = [
    LanguageCode::En,
    LanguageCode::Zh,
    LanguageCode::Hi,
    LanguageCode::Es,
    LanguageCode::Fr,
    LanguageCode::Ar,
    LanguageCode::Bn,
    LanguageCode::Pt,
    LanguageCode::Ru,
    LanguageCode::Ur,
  ];

  /// Code sent on the wire.
  pub fn code(self) -> &'static str {
    match self {
      LanguageCode::En => "en",
      LanguageCode::Zh => "zh",
      LanguageCode::Hi => "hi",
      LanguageCode::Es => "es",
      LanguageCode::Fr => "fr",
      LanguageCode::Ar => "ar",
      LanguageCode::Bn => "bn",
      LanguageCode::Pt => "pr",
      LanguageCode::Ru => "ru",
      LanguageCode::Ur => "ur",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      LanguageCode::En => "English",
      LanguageCode::Zh => "Mandarin Chinese",
      LanguageCode::Hi => "Hindi",
      LanguageCode::Es => "Spanish",
      LanguageCode::Fr => "French",
      LanguageCode::Ar => "Arabic",
      LanguageCode::Bn => "Bengali",
      LanguageCode::Pt => "Portuguese",
      LanguageCode::Ru => "Russian",
      LanguageCode::Ur => "Urdu",
    }
  }

  /// Placeholder hint for the query input. Not sent anywhere.
  pub fn greeting(self) -> &'static str {
    match self {
      LanguageCode::En => "Hello",
      LanguageCode::Zh => "你好",
      LanguageCode::Hi => "नमस्ते",
      LanguageCode::Es => "Hola",
      LanguageCode::Fr => "Bonjour",
      LanguageCode::Ar => "مرحبا",
      LanguageCode::Bn => "নমস্কার",
      LanguageCode::Pt => "Olá",
      LanguageCode::Ru => "Привет",
      LanguageCode::Ur => "السلام علیکم",
    }
  }
}

impl fmt::Display for LanguageCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

impl FromStr for LanguageCode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let needle = s.trim().to_lowercase();
    if needle == "pt" {
      return Ok(LanguageCode::Pt);
    }
    LanguageCode::ALL
      .into_iter()
      .find(|lang| lang.code() == needle)
      .ok_or_else(|| format!("unknown language code '{}'", s.trim()))
  }
}
