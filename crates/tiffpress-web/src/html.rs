//! Server-rendered pages for the browser flow.
//!
//! Markup is built with `maud`, which escapes every interpolated value, so
//! upload names and error messages can be rendered as-is.
//!
//! A batch where every file converted is answered with the archive itself (see
//! `handlers::convert`). Only a partial batch needs a page, because the errors
//! must be shown next to the download; that page embeds the archive as a
//! base64 `data:` URI since nothing is kept between requests. The page is
//! therefore about a third larger than the archive.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use tiffpress_core::{BatchReport, ConvertedFile, ARCHIVE_FILE_NAME, ARCHIVE_MIME};

const TITLE: &str = "TIF to JPG Converter";

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin:.6rem 0}\
.error{color:#b00020}\
.warning{color:#a15c00}\
table{border-collapse:collapse}\
td,th{padding:.2rem .6rem;border-bottom:1px solid #ddd;text-align:left}";

fn layout(body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (TITLE) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { (TITLE) }
                (body)
            }
        }
    }
}

fn upload_form(width: u32, height: u32) -> Markup {
    html! {
        form method="post" action="/convert" enctype="multipart/form-data" {
            label { "TIF files " input type="file" name="files" accept=".tif,.tiff" multiple; }
            label { "Width " input type="number" name="width" min="1" value=(width); }
            label { "Height " input type="number" name="height" min="1" value=(height); }
            button type="submit" { "Convert" }
        }
    }
}

fn error_list(messages: &[String]) -> Markup {
    html! {
        @if !messages.is_empty() {
            ul.error {
                @for message in messages {
                    li { (message) }
                }
            }
        }
    }
}

fn converted_row(file: &ConvertedFile) -> Markup {
    html! {
        tr {
            td { (file.source_name) }
            td { (file.entry_name) }
            td { (file.width) "x" (file.height) }
            td { (file.quality) }
            td {
                (format!("{:.1} KB", file.size as f64 / 1024.0))
                @if !file.within_budget {
                    " " span.warning { "(above size limit at lowest quality)" }
                }
            }
        }
    }
}

/// Upload form with the given defaults.
pub fn index_page(width: u32, height: u32) -> Markup {
    layout(upload_form(width, height))
}

/// Form plus a list of messages, used when nothing could be processed.
pub fn error_page(messages: &[String], width: u32, height: u32) -> Markup {
    layout(html! {
        (error_list(messages))
        (upload_form(width, height))
    })
}

/// Form with an empty selection: nothing happens, no download is offered.
pub fn empty_selection_page(width: u32, height: u32) -> Markup {
    layout(html! {
        p { "Select one or more TIF files to convert." }
        (upload_form(width, height))
    })
}

/// Per-file errors, a summary table and a download link for the archive.
pub fn result_page(report: &BatchReport, width: u32, height: u32) -> Markup {
    let converted: Vec<&ConvertedFile> = report.converted().collect();

    layout(html! {
        (error_list(&report.error_messages()))
        @if !converted.is_empty() {
            table {
                tr { th { "Upload" } th { "Entry" } th { "Size" } th { "Quality" } th { "Bytes" } }
                @for file in &converted {
                    (converted_row(file))
                }
            }
        }
        @if let Some(archive) = &report.archive {
            p {
                a href=(format!("data:{ARCHIVE_MIME};base64,{}", STANDARD.encode(archive)))
                    download=(ARCHIVE_FILE_NAME) { "Download All Images" }
            }
        }
        (upload_form(width, height))
    })
}
