//! HTML pages served by the upload front end

use crate::pipeline::DubbingOutput;
use crate::speech::Language;

const STYLE: &str = "body{font-family:sans-serif;max-width:760px;margin:2em auto;padding:0 1em}\
label{display:block;margin-top:1em}.error{color:#b00020}.transcript{white-space:pre-wrap;background:#f4f4f4;padding:1em}\
video{width:100%;margin-top:1em}";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>AI Voice Video</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h1>AI Voice-Over for Videos</h1>\n{}\n</body>\n</html>\n",
        STYLE, body
    )
}

pub fn upload_form() -> String {
    let options: String = Language::ALL.iter()
        .map(|l| format!("<option value=\"{}\">{}</option>", l.code(), l.name()))
        .collect();

    layout(&format!(
        "<p>Upload a video and its speech will be transcribed and re-voiced by an AI narrator.</p>\n\
         <form action=\"/process\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <label>Video (mp4, avi, mov)<br><input type=\"file\" name=\"video\" accept=\".mp4,.avi,.mov\" required></label>\n\
         <label>Voice language<br><select name=\"language\">{}</select></label>\n\
         <p><button type=\"submit\">Process Video</button></p>\n\
         </form>",
        options
    ))
}

pub fn result_page(output: &DubbingOutput) -> String {
    layout(&format!(
        "<p>Processing complete!</p>\n\
         <h2>Transcript ({})</h2>\n<div class=\"transcript\">{}</div>\n\
         <video controls src=\"/outputs/{id}\"></video>\n\
         <p><a href=\"/outputs/{id}?download=1\">Download AI Voice Video</a></p>\n\
         <p><a href=\"/\">Process another video</a></p>",
        output.language.name(),
        escape_html(&output.transcript),
        id = output.run_id,
    ))
}

pub fn error_page(message: &str) -> String {
    layout(&format!(
        "<p class=\"error\">{}</p>\n<p><a href=\"/\">Try again</a></p>",
        escape_html(message)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_form_lists_every_language() {
        let page = upload_form();
        for language in Language::ALL {
            assert!(page.contains(&format!("value=\"{}\"", language.code())));
        }
        assert!(page.contains("name=\"video\""));
        assert!(page.contains("Process Video"));
    }

    #[test]
    fn test_result_page_escapes_transcript() {
        let output = DubbingOutput {
            run_id: "abc123def456".to_string(),
            language: Language::Spanish,
            transcript: "<script>hola</script>".to_string(),
            video: PathBuf::from("outputs/abc123def456.mp4"),
        };
        let page = result_page(&output);
        assert!(page.contains("&lt;script&gt;hola&lt;/script&gt;"));
        assert!(page.contains("/outputs/abc123def456?download=1"));
        assert!(page.contains("Processing complete!"));
    }

    #[test]
    fn test_error_page() {
        let page = error_page("FFmpeg failed: a & b");
        assert!(page.contains("FFmpeg failed: a &amp; b"));
    }
}
