use crate::error::{RepairError, Result};
use remedy_archive::Archive;

/// WCAG AA threshold for normal text
const MIN_RATIO: f64 = 4.5;

/// Search step as a fraction of the remaining distance to white/black
const STEP: f64 = 0.05;

/// Foreground/background pairs known to fail 4.5:1 on common themes,
/// used when the caller supplies no palette of its own
pub const DEFAULT_LOW_CONTRAST: &[(&str, &str)] = &[
    ("#777777", "#ffffff"),
    ("#999999", "#ffffff"),
    ("#aaaaaa", "#ffffff"),
];

/// An sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Hex form, lowercase, leading `#`
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Euclidean distance to another color in RGB space
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// Parse `#rgb` or `#rrggbb`
pub fn parse_color(value: &str) -> Result<Rgb> {
    let hex = value.trim().strip_prefix('#').unwrap_or(value.trim());
    let expand = |c: u8| (c << 4) | c;
    let nibble = |c: char| c.to_digit(16).map(|d| d as u8);

    let digits: Option<Vec<u8>> = hex.chars().map(nibble).collect();
    let Some(digits) = digits else {
        return Err(RepairError::invalid_color(value));
    };
    match digits.as_slice() {
        [r, g, b] => Ok(Rgb {
            r: expand(*r),
            g: expand(*g),
            b: expand(*b),
        }),
        [r1, r2, g1, g2, b1, b2] => Ok(Rgb {
            r: (r1 << 4) | r2,
            g: (g1 << 4) | g2,
            b: (b1 << 4) | b2,
        }),
        _ => Err(RepairError::invalid_color(value)),
    }
}

fn channel_luminance(value: u8) -> f64 {
    let c = f64::from(value) / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Relative luminance per the WCAG perceptual formula
#[must_use]
pub fn relative_luminance(color: Rgb) -> f64 {
    0.2126 * channel_luminance(color.r)
        + 0.7152 * channel_luminance(color.g)
        + 0.0722 * channel_luminance(color.b)
}

/// WCAG contrast ratio between two colors (always >= 1.0)
#[must_use]
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

fn lerp(from: Rgb, to: Rgb, t: f64) -> Rgb {
    let mix = |a: u8, b: u8| -> u8 {
        let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgb {
        r: mix(from.r, to.r),
        g: mix(from.g, to.g),
        b: mix(from.b, to.b),
    }
}

fn search_toward(fg: Rgb, bg: Rgb, target: Rgb) -> Option<Rgb> {
    let mut step = 1u32;
    loop {
        let t = f64::from(step) * STEP;
        if t > 1.0 {
            return None;
        }
        let candidate = lerp(fg, target, t.min(1.0));
        if contrast_ratio(candidate, bg) >= MIN_RATIO {
            return Some(candidate);
        }
        if candidate == target {
            return None;
        }
        step += 1;
    }
}

/// Repair a foreground color against a background.
///
/// If the pair already meets 4.5:1 the foreground is returned unchanged.
/// Otherwise the foreground is stepped toward white and, separately, toward
/// black until the threshold is met; when both directions succeed the one
/// requiring less perceptual change from the original wins. When both
/// extremes fail, whichever extreme scores higher is returned.
#[must_use]
pub fn fix_contrast(fg: Rgb, bg: Rgb) -> Rgb {
    if contrast_ratio(fg, bg) >= MIN_RATIO {
        return fg;
    }
    let lighter = search_toward(fg, bg, Rgb::WHITE);
    let darker = search_toward(fg, bg, Rgb::BLACK);
    match (lighter, darker) {
        (Some(light), Some(dark)) => {
            if fg.distance(light) <= fg.distance(dark) {
                light
            } else {
                dark
            }
        }
        (Some(light), None) => light,
        (None, Some(dark)) => dark,
        (None, None) => {
            if contrast_ratio(Rgb::WHITE, bg) >= contrast_ratio(Rgb::BLACK, bg) {
                Rgb::WHITE
            } else {
                Rgb::BLACK
            }
        }
    }
}

/// One emitted contrast repair
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastFix {
    pub original: Rgb,
    pub background: Rgb,
    pub fixed: Rgb,
    pub ratio: f64,
}

fn override_marker(original: Rgb) -> String {
    format!("/* contrast override {} */", original.to_hex())
}

fn override_block(fix: &ContrastFix) -> String {
    let original = fix.original.to_hex();
    let fixed = fix.fixed.to_hex();
    format!(
        "\n{}\n[style*=\"color: {original}\"], [style*=\"color:{original}\"] {{ color: {fixed} !important; }}\n",
        override_marker(fix.original)
    )
}

/// Repair every failing pair in the palette by emitting CSS overrides.
///
/// The override block is appended to the first stylesheet member; when the
/// archive has none, it is injected as a `<style>` head element into each
/// content document. Re-running with the same palette is a no-op: the
/// marker comment is checked before any mutation. Returns the modified
/// member paths and the fixes applied.
pub fn repair_contrast(
    archive: &mut Archive,
    palette: Option<&[(String, String)]>,
) -> Result<(Vec<String>, Vec<ContrastFix>)> {
    let owned_default: Vec<(String, String)> = DEFAULT_LOW_CONTRAST
        .iter()
        .map(|(f, b)| ((*f).to_string(), (*b).to_string()))
        .collect();
    let pairs = palette.unwrap_or(&owned_default);

    let mut fixes = Vec::new();
    for (fg_hex, bg_hex) in pairs {
        let fg = parse_color(fg_hex)?;
        let bg = parse_color(bg_hex)?;
        if contrast_ratio(fg, bg) >= MIN_RATIO {
            continue;
        }
        let fixed = fix_contrast(fg, bg);
        fixes.push(ContrastFix {
            original: fg,
            background: bg,
            fixed,
            ratio: contrast_ratio(fixed, bg),
        });
    }
    if fixes.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut modified = Vec::new();
    let stylesheets = archive.stylesheets();
    if let Some(sheet) = stylesheets.first() {
        let mut content = archive.text(sheet)?.to_string();
        let mut touched = false;
        for fix in &fixes {
            if content.contains(&override_marker(fix.original)) {
                continue;
            }
            content.push_str(&override_block(fix));
            touched = true;
        }
        if touched {
            archive.set_text(sheet, content)?;
            modified.push(sheet.clone());
        }
        return Ok((modified, fixes));
    }

    for path in archive.content_documents() {
        let content = archive.text(&path)?;
        let mut blocks = String::new();
        for fix in &fixes {
            if !content.contains(&override_marker(fix.original)) {
                blocks.push_str(&override_block(fix));
            }
        }
        if blocks.is_empty() {
            continue;
        }
        let styled = format!("<style>{blocks}</style>");
        let rewritten = if let Some(idx) = content.find("</head>") {
            format!("{}{}{}", &content[..idx], styled, &content[idx..])
        } else if let Some(idx) = content.find("<body") {
            format!("{}{}{}", &content[..idx], styled, &content[idx..])
        } else {
            continue;
        };
        archive.set_text(&path, rewritten)?;
        modified.push(path);
    }
    Ok((modified, fixes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(parse_color("#fff").unwrap(), Rgb::WHITE);
        assert_eq!(parse_color("#000000").unwrap(), Rgb::BLACK);
        assert_eq!(
            parse_color("#777777").unwrap(),
            Rgb {
                r: 0x77,
                g: 0x77,
                b: 0x77
            }
        );
        assert!(parse_color("#77").is_err());
        assert!(parse_color("notacolor").is_err());
    }

    #[test]
    fn known_ratios_match_the_formula() {
        let white_black = contrast_ratio(Rgb::WHITE, Rgb::BLACK);
        assert!((white_black - 21.0).abs() < 0.01);
        assert!((contrast_ratio(Rgb::WHITE, Rgb::WHITE) - 1.0).abs() < f64::EPSILON);

        // #777777 on white is the classic near-miss, ~4.48:1.
        let gray = parse_color("#777777").unwrap();
        let ratio = contrast_ratio(gray, Rgb::WHITE);
        assert!(ratio < MIN_RATIO && ratio > 4.0);
    }

    #[test]
    fn passing_pairs_are_untouched() {
        let fg = parse_color("#595959").unwrap();
        assert_eq!(fix_contrast(fg, Rgb::WHITE), fg);
    }

    #[test]
    fn near_miss_gray_is_darkened_minimally() {
        let gray = parse_color("#777777").unwrap();
        let fixed = fix_contrast(gray, Rgb::WHITE);
        assert!(contrast_ratio(fixed, Rgb::WHITE) >= MIN_RATIO);
        // On a white background the fix must move toward black.
        assert!(fixed.r < gray.r);
        // One 5% step should have been enough for a near-miss.
        assert!(gray.distance(fixed) < 40.0);
    }

    #[test]
    fn repair_appends_override_to_stylesheet_once() {
        let mut archive = Archive::new();
        archive.insert_text("OEBPS/styles.css", "body { color: #777777; }\n");
        archive.insert_text("OEBPS/ch1.xhtml", "<html><body>x</body></html>");

        let (modified, fixes) = repair_contrast(&mut archive, None).unwrap();
        assert_eq!(modified, vec!["OEBPS/styles.css".to_string()]);
        assert!(!fixes.is_empty());
        let css = archive.text("OEBPS/styles.css").unwrap().to_string();
        assert!(css.contains("contrast override #777777"));
        assert!(css.contains("!important"));

        // Second run is a no-op.
        let (modified, _) = repair_contrast(&mut archive, None).unwrap();
        assert!(modified.is_empty());
        assert_eq!(archive.text("OEBPS/styles.css").unwrap(), css);
    }

    #[test]
    fn repair_injects_style_element_without_stylesheet() {
        let mut archive = Archive::new();
        archive.insert_text(
            "OEBPS/ch1.xhtml",
            "<html><head><title>t</title></head><body>x</body></html>",
        );
        let palette = vec![("#999999".to_string(), "#ffffff".to_string())];
        let (modified, _) = repair_contrast(&mut archive, Some(&palette)).unwrap();
        assert_eq!(modified, vec!["OEBPS/ch1.xhtml".to_string()]);
        let doc = archive.text("OEBPS/ch1.xhtml").unwrap();
        assert!(doc.contains("<style>"));
        assert!(doc.contains("</style></head>"));
    }

    proptest! {
        #[test]
        fn proptest_fix_meets_threshold_or_best_extreme(
            r in 0u8..=255, g in 0u8..=255, b in 0u8..=255,
            br in 0u8..=255, bg_ in 0u8..=255, bb in 0u8..=255,
        ) {
            let fg = Rgb { r, g, b };
            let bg = Rgb { r: br, g: bg_, b: bb };
            let fixed = fix_contrast(fg, bg);
            let ratio = contrast_ratio(fixed, bg);
            if ratio < MIN_RATIO {
                // Both extremes failed; the better one must have been chosen.
                let best = contrast_ratio(Rgb::WHITE, bg).max(contrast_ratio(Rgb::BLACK, bg));
                prop_assert!(best < MIN_RATIO);
                prop_assert!((ratio - best).abs() < 1e-9);
            }
        }

        #[test]
        fn proptest_ratio_is_symmetric_and_bounded(
            r in 0u8..=255, g in 0u8..=255, b in 0u8..=255,
        ) {
            let c = Rgb { r, g, b };
            let against_white = contrast_ratio(c, Rgb::WHITE);
            prop_assert!((1.0..=21.0 + 1e-9).contains(&against_white));
            prop_assert!((contrast_ratio(Rgb::WHITE, c) - against_white).abs() < 1e-12);
        }
    }
}
