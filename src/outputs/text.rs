//! Plain-text rendering of a run for the terminal.

use crate::models::{FollowUp, SearchSession};

/// Numbered article list, then the summary, then any follow-up answers.
pub fn render(session: &SearchSession, answers: &[FollowUp]) -> String {
    let mut out = format!(
        "# '{}' 뉴스 {}건\n\n",
        session.keyword,
        session.results.len()
    );
    for (i, r) in session.results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, r.title));
        match r.source_host() {
            Some(host) => out.push_str(&format!("   {} ({host})\n", r.link)),
            None => out.push_str(&format!("   {}\n", r.link)),
        }
        if !r.snippet.is_empty() {
            out.push_str(&format!("   {}\n", r.snippet));
        }
    }

    out.push_str(&format!("\n## 요약\n\n{}\n", session.summary.trim_end()));
    for follow_up in answers {
        out.push_str(&format!(
            "\n## Q. {}\n\n{}\n",
            follow_up.question,
            follow_up.answer.trim_end()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchResult;

    #[test]
    fn test_render_lists_results_summary_and_answers() {
        let session = SearchSession {
            keyword: "반도체".to_string(),
            results: vec![SearchResult {
                title: "반도체 수출 증가".to_string(),
                link: "https://www.mk.co.kr/news/1".to_string(),
                snippet: "수출 호조".to_string(),
                content: String::new(),
            }],
            summary: "요약 본문\n".to_string(),
        };
        let answers = vec![FollowUp {
            question: "왜?".to_string(),
            answer: "수요 증가".to_string(),
        }];

        let text = render(&session, &answers);
        assert!(text.starts_with("# '반도체' 뉴스 1건\n\n1. 반도체 수출 증가\n"));
        assert!(text.contains("   https://www.mk.co.kr/news/1 (www.mk.co.kr)\n   수출 호조\n"));
        assert!(text.contains("## 요약\n\n요약 본문\n"));
        assert!(text.ends_with("## Q. 왜?\n\n수요 증가\n"));
    }
}
