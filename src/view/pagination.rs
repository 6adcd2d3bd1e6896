#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageLink {
    Previous { target: usize, enabled: bool },
    Page { number: usize, active: bool },
    Ellipsis,
    Next { target: usize, enabled: bool },
}

/// Nothing is shown for a single page. Otherwise the first and last pages and
/// every page within two of `current` are listed, with a gap marker standing in
/// for the page three away on either side.
pub fn page_window(current: usize, total: usize) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(total.min(9) + 2);
    out.push(PageLink::Previous {
        target: current.saturating_sub(1),
        enabled: current > 1,
    });

    for number in 1..=total {
        let near = number + 2 >= current && number <= current + 2;
        if number == 1 || number == total || near {
            out.push(PageLink::Page {
                number,
                active: number == current,
            });
        } else if number + 3 == current || number == current + 3 {
            out.push(PageLink::Ellipsis);
        }
    }

    out.push(PageLink::Next {
        target: current + 1,
        enabled: current < total,
    });
    out
}

#[cfg(test)]
pub(crate) fn listed_pages(links: &[PageLink]) -> Vec<usize> {
    links
        .iter()
        .filter_map(|l| match l {
            PageLink::Page { number, .. } => Some(*number),
            _ => None,
        })
        .collect()
}
