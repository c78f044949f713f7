//! Server-rendered index page.
//!
//! The page shell is embedded at compile time; the task tree and category
//! links are rendered here and spliced into the `{{tree}}` and
//! `{{categories}}` placeholders.

use std::collections::HashMap;
use std::fmt::Write;

use axum::extract::State;
use axum::response::Html;

use crate::error::AppError;
use crate::models::{Progress, TaskNode};
use crate::services::Overview;
use crate::state::AppState;

const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let overview = state.tasks.overview().await?;
    Ok(Html(render_index(&overview)))
}

pub fn render_index(overview: &Overview) -> String {
    INDEX_TEMPLATE
        .replace("{{categories}}", &render_categories(&overview.categories))
        .replace("{{tree}}", &render_tree(&overview.tasks, &overview.progress))
}

fn render_categories(categories: &[String]) -> String {
    let mut html = String::new();
    for category in categories {
        let escaped = html_escape(category);
        let _ = write!(
            html,
            r##"<a class="filter" href="#" data-list="{escaped}">{escaped}</a>"##
        );
    }
    html
}

enum Step<'a> {
    Open(&'a TaskNode),
    Close,
}

fn render_tree(nodes: &[TaskNode], progress: &HashMap<i64, Progress>) -> String {
    if nodes.is_empty() {
        return r#"<p class="empty-state">Nothing to do yet</p>"#.to_string();
    }

    let mut html = String::from(r#"<ul class="tree">"#);
    let mut stack: Vec<Step<'_>> = nodes.iter().rev().map(Step::Open).collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Close => html.push_str("</ul></li>"),
            Step::Open(node) => {
                render_item(&mut html, node, progress.get(&node.task.id));
                if node.children.is_empty() {
                    html.push_str("</li>");
                } else {
                    html.push_str("<ul>");
                    stack.push(Step::Close);
                    stack.extend(node.children.iter().rev().map(Step::Open));
                }
            }
        }
    }

    html.push_str("</ul>");
    html
}

fn render_item(html: &mut String, node: &TaskNode, progress: Option<&Progress>) {
    let task = &node.task;
    let mut classes = vec!["task"];
    if task.is_done {
        classes.push("done");
    }
    if task.is_today {
        classes.push("today");
    }

    let _ = write!(
        html,
        r#"<li class="{}" data-id="{}"><input type="checkbox" class="toggle"{}> <span class="title">{}</span>"#,
        classes.join(" "),
        task.id,
        if task.is_done { " checked" } else { "" },
        html_escape(&task.title),
    );

    if let Some(category) = task.category.as_deref().filter(|c| !c.is_empty()) {
        let _ = write!(html, r#" <span class="badge">{}</span>"#, html_escape(category));
    }
    if let Some(p) = progress.filter(|p| p.done.is_none()) {
        let _ = write!(html, r#" <span class="progress">{}%</span>"#, p.percent);
    }

    let _ = write!(
        html,
        r#" <button class="today-btn" data-today="{}">&#9728;</button><button class="add-child">+</button><button class="delete">&times;</button>"#,
        !task.is_today,
    );
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
