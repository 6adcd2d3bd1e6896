use crate::cli::args::CliArgs;
use crate::view::SortKey;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(size) = args.page_size {
        if size == 0 {
            return Err("invalid page-size, expected positive integer".to_string());
        }
    }
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid page, pages start at 1".to_string());
        }
    }
    if let Some(raw) = args.sort.as_deref() {
        SortKey::parse(raw)
            .ok_or_else(|| format!("invalid --sort '{raw}', expected id, title or price"))?;
    }
    if let Some(raw) = args.base_url.as_deref() {
        match reqwest::Url::parse(raw.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(format!("invalid --base-url '{raw}'")),
        }
    }
    if args.once && args.export {
        return Err("use either --once or --export, not both".to_string());
    }
    Ok(())
}
