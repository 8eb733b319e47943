//! Text renderings of a result list for summarization and chat.
//!
//! Everything here is pure and deterministic. [`build_context`] is the
//! bounded digest handed to a language model; [`simple_summarize`] and
//! [`simple_chat_answer`] are the local formatters used when no model is
//! configured or the model call fails.

use crate::models::SearchResult;
use crate::utils::truncate_chars;

/// Results included in a chat context by default.
pub const CONTEXT_MAX_ITEMS: usize = 6;
const CONTEXT_ITEM_CHARS: usize = 600;
const PROMPT_ITEM_CHARS: usize = 500;
const SUMMARY_ITEM_CHARS: usize = 300;
const ANSWER_ITEM_CHARS: usize = 240;
const ANSWER_MAX_ITEMS: usize = 4;

pub const NO_NEWS_MESSAGE: &str = "검색된 뉴스가 없습니다.";

/// Numbered title + body blocks for the first `max_items` results.
///
/// Each block carries the content, or the snippet when there is no content,
/// cut to 600 characters. Blocks are separated by a blank line.
pub fn build_context(results: &[SearchResult], max_items: usize) -> String {
    results
        .iter()
        .take(max_items)
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. 제목: {}\n   내용: {}",
                i + 1,
                r.title,
                truncate_chars(r.body_or_snippet(), CONTEXT_ITEM_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt asking a model to summarize `results` found for `keyword`.
pub fn summary_prompt(results: &[SearchResult], keyword: &str) -> String {
    let items: String = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let body = if !r.content.is_empty() {
                format!("   내용: {}\n", truncate_chars(&r.content, PROMPT_ITEM_CHARS))
            } else if !r.snippet.is_empty() {
                format!("   요약: {}\n", r.snippet)
            } else {
                String::new()
            };
            format!("{}. {}\n{body}   링크: {}\n\n", i + 1, r.title, r.link)
        })
        .collect();
    let news = format!("키워드: {keyword}\n\n{items}");

    format!(
        "당신은 뉴스 요약 전문가입니다. 주어진 뉴스들을 간결하고 명확하게 요약해주세요.\n\n\
         다음 뉴스들을 요약해주세요:\n\n{news}\n\
         위 뉴스들을 종합하여 핵심 내용을 간결하게 요약해주세요."
    )
}

/// Prompt asking a model to answer `question` from the news context only.
pub fn chat_prompt(results: &[SearchResult], keyword: &str, question: &str) -> String {
    let context = build_context(results, CONTEXT_MAX_ITEMS);
    format!(
        "당신은 뉴스에 대해 대화하는 친근한 전문가입니다.\n\n\
         - 사용자의 질문에 정확히 맞는 답만 하세요.\n\
         - 뉴스 내용을 근거로 하되, 짧은 질문에는 짧게, 구체적인 질문에는 구체적으로 답하세요.\n\
         - 뉴스에 없는 내용은 추측하지 말고 \"뉴스에서는 이 부분이 안 나와 있어요\"처럼 말하세요.\n\n\
         키워드: {keyword}\n\n뉴스 목록:\n{context}\n\n사용자 질문: {question}\n\n\
         위 뉴스만 참고해서 이 질문에만 해당하는 답변을 해주세요."
    )
}

/// Local summary: a header, then each result's title, a short body and its link.
pub fn simple_summarize(results: &[SearchResult], keyword: &str) -> String {
    if results.is_empty() {
        return NO_NEWS_MESSAGE.to_string();
    }

    let items: String = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let body = if !r.content.is_empty() {
                format!("   {}...\n", truncate_chars(&r.content, SUMMARY_ITEM_CHARS))
            } else if !r.snippet.is_empty() {
                format!("   {}\n", r.snippet)
            } else {
                String::new()
            };
            format!("【{}】 {}\n{body}   링크: {}\n\n", i + 1, r.title, r.link)
        })
        .collect();
    format!("'{keyword}' 관련 뉴스 {}개를 찾았습니다:\n\n{items}", results.len())
}

/// What kind of answer a question is after, judged from its wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuestionKind {
    Summary,
    Reason,
    Method,
    Core,
    General,
}

impl QuestionKind {
    fn of(question: &str) -> Self {
        let has = |words: &[&str]| words.iter().any(|w| question.contains(w));
        if has(&["요약", "총정리", "한번에", "전체"]) {
            QuestionKind::Summary
        } else if has(&["왜", "이유", "원인"]) {
            QuestionKind::Reason
        } else if has(&["어떻게", "방법", "대응", "대처"]) {
            QuestionKind::Method
        } else if has(&["뭐가", "무엇", "뭐야", "핵심"]) {
            QuestionKind::Core
        } else {
            QuestionKind::General
        }
    }

    fn intro(self) -> &'static str {
        match self {
            QuestionKind::Summary => "요약해드릴게요. ",
            QuestionKind::Reason => "이유나 배경 위주로 정리해볼게요. ",
            QuestionKind::Method => "방법이나 대응 쪽으로 말씀드릴게요. ",
            QuestionKind::Core => "핵심만 말씀드리면요. ",
            QuestionKind::General => "질문하신 걸 기준으로 뉴스에서 찾아본 내용이에요. ",
        }
    }
}

/// Answer `question` by keyword overlap with the results, without a model.
///
/// Results are ranked by how many question words (longer than one
/// character) appear in their title and content; ties keep search order.
/// Up to four matching results are quoted, or the first four when none match.
pub fn simple_chat_answer(question: &str, results: &[SearchResult], keyword: &str) -> String {
    let lowered = question.trim().to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .collect();

    let mut scored: Vec<(usize, &SearchResult)> = results
        .iter()
        .map(|r| {
            let text = format!("{} {}", r.title, r.content).to_lowercase();
            (words.iter().filter(|w| text.contains(*w)).count(), r)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let matching: Vec<&SearchResult> = scored
        .iter()
        .filter(|(score, _)| *score > 0)
        .map(|(_, r)| *r)
        .take(ANSWER_MAX_ITEMS)
        .collect();
    let top = if matching.is_empty() {
        scored.iter().map(|(_, r)| *r).take(ANSWER_MAX_ITEMS).collect()
    } else {
        matching
    };
    if top.is_empty() {
        return format!(
            "'{keyword}' 관련 뉴스는 있는데, 이 질문과 딱 맞는 내용은 찾기 어려워요. \
             다른 방식으로 물어보시거나, 더 구체적인 질문을 주시면 도와드릴게요."
        );
    }

    let mut lines = vec![QuestionKind::of(question.trim()).intro().to_string()];
    for r in top {
        lines.push(format!("• {}", r.title));
        let body = r.body_or_snippet();
        if !body.is_empty() {
            let cut = truncate_chars(body, ANSWER_ITEM_CHARS);
            let ellipsis = if cut.len() < body.len() { "..." } else { "" };
            lines.push(format!("  {}{}", cut.trim(), ellipsis));
        }
    }
    lines.join("\n")
}
