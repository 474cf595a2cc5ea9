//! Content-Security-Policy rendering.
//!
//! # Design Decisions
//! - Directive order is fixed, so the same config always renders the same header
//! - An unset directive is omitted; a set but empty directive is emitted bare
//! - The request nonce is appended to default-src, style-src and script-src
//!   only. This is not configurable.

use serde::{Deserialize, Serialize};

use crate::security::nonce::Nonce;

/// CSP directive configuration.
///
/// `None` means "do not emit this directive". `Some(vec![])` emits the
/// directive name with only the nonce (or nothing) after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CspConfig {
    pub default_src: Option<Vec<String>>,
    pub style_src: Option<Vec<String>>,
    pub script_src: Option<Vec<String>>,
    pub img_src: Option<Vec<String>>,
    pub font_src: Option<Vec<String>>,
    pub connect_src: Option<Vec<String>>,
    pub frame_src: Option<Vec<String>>,
    pub media_src: Option<Vec<String>>,
    pub object_src: Option<Vec<String>>,
    pub manifest_src: Option<Vec<String>>,
    pub form_action: Option<Vec<String>>,
}

impl CspConfig {
    /// Directives in render order: `(name, takes_nonce, sources)`.
    pub fn directives(&self) -> [(&'static str, bool, Option<&[String]>); 11] {
        [
            ("default-src", true, self.default_src.as_deref()),
            ("style-src", true, self.style_src.as_deref()),
            ("script-src", true, self.script_src.as_deref()),
            ("img-src", false, self.img_src.as_deref()),
            ("font-src", false, self.font_src.as_deref()),
            ("connect-src", false, self.connect_src.as_deref()),
            ("frame-src", false, self.frame_src.as_deref()),
            ("media-src", false, self.media_src.as_deref()),
            ("object-src", false, self.object_src.as_deref()),
            ("manifest-src", false, self.manifest_src.as_deref()),
            ("form-action", false, self.form_action.as_deref()),
        ]
    }

    /// True when no directive is set and no header would be emitted.
    pub fn is_empty(&self) -> bool {
        self.directives().iter().all(|(_, _, sources)| sources.is_none())
    }
}

/// Render the header value for `config` with `nonce` injected.
///
/// Returns an empty string when no directive is set. Callers must skip the
/// header in that case: an empty policy is not the same as no policy.
pub fn build_csp(config: &CspConfig, nonce: &Nonce) -> String {
    let nonce_source = format!("'nonce-{}'", nonce.as_str());

    config
        .directives()
        .into_iter()
        .filter_map(|(name, takes_nonce, sources)| {
            let sources = sources?;
            let mut tokens: Vec<&str> = sources.iter().map(String::as_str).collect();
            if takes_nonce {
                tokens.push(&nonce_source);
            }

            if tokens.is_empty() {
                Some(name.to_string())
            } else {
                Some(format!("{} {}", name, tokens.join(" ")))
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::nonce::NonceGenerator;

    fn nonce() -> Nonce {
        NonceGenerator::new().generate().unwrap()
    }

    fn sources(tokens: &[&str]) -> Option<Vec<String>> {
        Some(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_default_src_only() {
        let nonce = nonce();
        let config = CspConfig {
            default_src: sources(&["'self'"]),
            ..Default::default()
        };

        assert_eq!(
            build_csp(&config, &nonce),
            format!("default-src 'self' 'nonce-{}'", nonce)
        );
    }

    #[test]
    fn test_no_directives_renders_nothing() {
        let config = CspConfig::default();
        assert!(config.is_empty());
        assert_eq!(build_csp(&config, &nonce()), "");
    }

    #[test]
    fn test_fixed_order_and_nonce_targets() {
        let nonce = nonce();
        let config = CspConfig {
            form_action: sources(&["'self'"]),
            img_src: sources(&["'self'", "data:"]),
            script_src: sources(&["'self'", "https://cdn.example.com"]),
            object_src: sources(&["'none'"]),
            ..Default::default()
        };

        assert_eq!(
            build_csp(&config, &nonce),
            format!(
                "script-src 'self' https://cdn.example.com 'nonce-{n}'; \
                 img-src 'self' data:; object-src 'none'; form-action 'self'",
                n = nonce
            )
        );
    }

    #[test]
    fn test_empty_list_is_not_unset() {
        let nonce = nonce();
        let config = CspConfig {
            style_src: Some(vec![]),
            frame_src: Some(vec![]),
            ..Default::default()
        };

        assert!(!config.is_empty());
        assert_eq!(
            build_csp(&config, &nonce),
            format!("style-src 'nonce-{}'; frame-src", nonce)
        );
    }

    #[test]
    fn test_render_does_not_mutate_config() {
        let config = CspConfig {
            default_src: sources(&["'self'"]),
            ..Default::default()
        };
        let before = config.clone();

        build_csp(&config, &nonce());
        build_csp(&config, &nonce());

        assert_eq!(config, before);
    }
}
