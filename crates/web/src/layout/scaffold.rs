//! Dashboard navigation scaffold and the chat section that reuses it.

use askama::Template;

use super::{Layout, Markup, RenderContext, RenderError};

/// A fixed menu entry: route path and `DashboardLayout` label key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub path: &'static str,
    pub label_key: &'static str,
}

/// Dashboard menu, in display order.
pub const MENU: [MenuEntry; 2] = [
    MenuEntry {
        path: "/dashboard",
        label_key: "home",
    },
    MenuEntry {
        path: "/chat",
        label_key: "chat",
    },
];

struct MenuItem {
    href: String,
    label: String,
    active: bool,
}

#[derive(Template)]
#[template(path = "layouts/dashboard_scaffold.html")]
struct ScaffoldTemplate {
    menu: Vec<MenuItem>,
    inner: Markup,
}

/// Adds the dashboard menu above the page content.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardScaffold;

impl Layout for DashboardScaffold {
    fn wrap(&self, inner: Markup, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
        let t = ctx.bundle("DashboardLayout")?;
        let menu = MENU
            .iter()
            .map(|entry| {
                Ok(MenuItem {
                    href: ctx.href(entry.path),
                    label: t.text(entry.label_key)?,
                    active: ctx.path == entry.path,
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        Markup::render(&ScaffoldTemplate { menu, inner })
    }
}

/// Chat section layout: the dashboard scaffold, unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatLayout;

impl Layout for ChatLayout {
    fn wrap(&self, inner: Markup, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
        DashboardScaffold.wrap(inner, ctx)
    }
}
