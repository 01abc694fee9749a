use chrono::{DateTime, Utc};

use riskwatch_common::{AnalysisRecord, CategoryResult, ScoreBand, RUBRIC_MAX, RUBRIC_MIN};

/// Minimal HTML escaping for text and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// (foreground, background) badge colours.
fn badge_colors(band: ScoreBand) -> (&'static str, &'static str) {
    match band {
        ScoreBand::Low => ("#27ae60", "#d5f4e6"),
        ScoreBand::Moderate => ("#f39c12", "#fff3cd"),
        ScoreBand::High => ("#e74c3c", "#f8d7da"),
        ScoreBand::Unset => ("#7f8c8d", "#ecf0f1"),
        ScoreBand::OutOfRubric => ("#8e44ad", "#f3e5f5"),
    }
}

fn score_badge(result: &CategoryResult) -> String {
    let band = result.band();
    let (fg, bg) = badge_colors(band);
    let (label, title) = match band {
        ScoreBand::Unset => ("\u{2013}".to_string(), "not extracted".to_string()),
        ScoreBand::OutOfRubric => (
            format!("{}&nbsp;\u{26a0}", result.score()),
            format!("outside the {RUBRIC_MIN}-{RUBRIC_MAX} scoring rubric"),
        ),
        _ => (result.score().to_string(), String::new()),
    };
    format!(
        r#"<span class="score" title="{title}" style="background:{bg};color:{fg};padding:4px 10px;border-radius:4px;font-weight:bold">{label}</span>"#
    )
}

fn source_links(urls: &[String]) -> String {
    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            format!(
                r#"<a href="{}" target="_blank" style="color:#3498db">Source {}</a>"#,
                escape_html(url),
                i + 1
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Render the weekly digest. Zero records renders an empty table.
pub fn render_digest(records: &[AnalysisRecord], batch_index: usize, generated_at: DateTime<Utc>) -> String {
    let mut rows = String::new();
    for record in records {
        let name = escape_html(record.entity_name());
        for result in record.categories() {
            let points: String = result
                .evidence_points()
                .iter()
                .map(|p| format!("<li style=\"margin-bottom:4px\">{}</li>", escape_html(p)))
                .collect();
            rows.push_str(&format!(
                r#"
      <tr>
        <td style="padding:10px;border:1px solid #ddd;font-weight:bold;color:#2c3e50">{name}</td>
        <td style="padding:10px;border:1px solid #ddd;color:#7f8c8d;font-size:0.9em">{situation}</td>
        <td style="padding:10px;border:1px solid #ddd;text-align:center">{badge}</td>
        <td style="padding:10px;border:1px solid #ddd"><ul style="margin:0;padding-left:18px">{points}</ul></td>
        <td style="padding:10px;border:1px solid #ddd;font-size:0.85em">{sources}</td>
      </tr>"#,
                situation = result.category().label(),
                badge = score_badge(result),
                sources = source_links(result.source_urls()),
            ));
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Weekly Company Analysis - Week {batch_index}</title></head>
<body style="font-family:Arial,sans-serif;background:#f5f5f5;padding:20px">
  <div style="max-width:1200px;margin:0 auto;background:white;padding:30px;border-radius:8px">
    <h1 style="color:#2c3e50;border-bottom:3px solid #3498db;padding-bottom:10px">Weekly Company Analysis Report</h1>
    <div style="background:#ecf0f1;padding:15px;border-radius:5px;margin-bottom:20px">
      <strong>Week {batch_index}</strong> | {generated} | Companies: {companies}
    </div>
    <table style="width:100%;border-collapse:collapse">
      <thead><tr style="background:#34495e;color:white">
        <th style="padding:12px;text-align:left;width:15%">Company</th>
        <th style="padding:12px;text-align:left;width:18%">Situation</th>
        <th style="padding:12px;text-align:left;width:7%">Score</th>
        <th style="padding:12px;text-align:left;width:45%">Key Evidence</th>
        <th style="padding:12px;text-align:left;width:15%">Sources</th>
      </tr></thead>
      <tbody>{rows}
      </tbody>
    </table>
    <div style="margin-top:30px;padding-top:20px;border-top:2px solid #ecf0f1;text-align:center;color:#7f8c8d;font-size:0.9em">
      Auto-generated | Scoring: 1-2 Low Risk, 3 Moderate, 4-5 High Risk
    </div>
  </div>
</body></html>
"#,
        generated = generated_at.format("%B %d, %Y at %H:%M UTC"),
        companies = records.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use riskwatch_common::Category;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn empty_digest_renders() {
        let html = render_digest(&[], 2, now());
        assert!(html.contains("<strong>Week 2</strong>"));
        assert!(html.contains("Companies: 0"));
        assert!(!html.contains("<tr>\n"));
    }

    #[test]
    fn record_text_is_escaped_and_sources_numbered() {
        let mut record = AnalysisRecord::new("A&B <Holdings>").unwrap();
        record.set(CategoryResult::extracted(
            Category::ResourceConstraints,
            2,
            vec!["<script>alert(1)</script> shortage".into()],
            vec!["https://x.example.com/?a=1&b=2".into(), "https://y.example.com".into()],
        ));

        let html = render_digest(&[record], 1, now());
        assert!(html.contains("A&amp;B &lt;Holdings&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"href="https://x.example.com/?a=1&amp;b=2""#));
        assert!(html.contains(">Source 1</a> | <a"));
        assert!(html.contains(">Source 2</a>"));
        assert!(!html.contains("Source 3"));
    }

    #[test]
    fn badges_follow_score_bands() {
        let unset = CategoryResult::unset(Category::MarginPressure);
        assert!(score_badge(&unset).contains(">\u{2013}</span>"));

        let high = CategoryResult::extracted(Category::MarginPressure, 5, vec![], vec![]);
        assert!(score_badge(&high).contains("#e74c3c"));

        let low = CategoryResult::extracted(Category::MarginPressure, 1, vec![], vec![]);
        assert!(score_badge(&low).contains("#27ae60"));

        let odd = CategoryResult::extracted(Category::MarginPressure, 7, vec![], vec![]);
        let badge = score_badge(&odd);
        assert!(badge.contains("outside the 1-5 scoring rubric"));
        assert!(badge.contains(">7&nbsp;"));
    }
}
