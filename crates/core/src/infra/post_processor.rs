/// テキスト後処理: LLM 応答の整形・履歴書バイト列からの文字抽出
pub struct PostProcessor;

impl PostProcessor {
    /// コードフェンス（```json ... ```）を取り除いて前後トリム。
    /// フェンスがなければトリムのみ。
    pub fn strip_code_fence(text: &str) -> String {
        let trimmed = text.trim();
        let Some(open) = trimmed.find("```") else {
            return trimmed.to_string();
        };

        let after_open = &trimmed[open + 3..];
        // 言語タグ（json 等）を読み飛ばす
        let tag_len = after_open
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(after_open.len());
        let body = &after_open[tag_len..];

        let inner = match body.find("```") {
            Some(close) => &body[..close],
            None => body,
        };
        inner.trim().to_string()
    }

    /// 連続空白（改行含む）を1つの空白に圧縮して前後トリム
    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// 印字可能 ASCII（32–126）と CR/LF だけを残して空白を圧縮する。
    /// PDF の厳密な解析ではなく、ベストエフォートの文字拾い。
    pub fn scrape_printable(bytes: &[u8]) -> String {
        let kept: String = bytes
            .iter()
            .filter(|&&b| (32..=126).contains(&b) || b == b'\n' || b == b'\r')
            .map(|&b| b as char)
            .collect();
        Self::collapse_whitespace(&kept)
    }

    /// 空白区切りの単語数
    pub fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }
}
