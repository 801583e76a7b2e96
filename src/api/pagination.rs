use serde::Deserialize;

pub(crate) const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

impl PageQuery {
    pub(crate) fn offset(&self) -> i64 {
        self.skip.max(0)
    }

    pub(crate) fn bounded_limit(&self) -> i64 {
        self.limit.clamp(1, 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_applied() {
        let page = PageQuery { skip: -5, limit: 0 };
        assert_eq!(page.offset(), 0);
        assert_eq!(page.bounded_limit(), 1);

        let page = PageQuery { skip: 10, limit: 5000 };
        assert_eq!(page.offset(), 10);
        assert_eq!(page.bounded_limit(), 1000);
    }
}
