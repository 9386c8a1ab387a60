//! Function parameter lists.
//!
//! A parameter list `[a [b 1] / c * d #* rest #** kw]` is parsed into four
//! sections: positional parameters, keyword-only parameters (after `*` or the
//! rest capture), the rest capture itself, and the mapping rest. Every name is
//! protected in the function body and in the default values of the parameters
//! that follow it.

use crate::ast::{Node, SeqKind};
use crate::SymwalkError;

use super::{Protected, Substituter};

/// One entry of the positional or keyword-only section.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Name(String),
    /// `[name default]`
    WithDefault(String, Node),
    /// `/`
    PositionalOnlyMarker,
    /// Anything else, substituted as an ordinary expression.
    Other(Node),
}

/// The rest capture between the positional and keyword-only sections.
#[derive(Debug, Clone, PartialEq)]
pub enum RestCapture {
    /// `*`
    Bare,
    /// `#* name`
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamList {
    pub positional: Vec<Param>,
    pub keyword_only: Vec<Param>,
    pub rest: Option<RestCapture>,
    pub mapping_rest: Option<String>,
}

impl Param {
    fn parse(node: &Node) -> Param {
        match node {
            Node::Symbol(name) if name == "/" => Param::PositionalOnlyMarker,
            Node::Symbol(name) => Param::Name(name.clone()),
            Node::Sequence(SeqKind::List, pair) if pair.len() == 2 => match &pair[0] {
                Node::Symbol(name) => Param::WithDefault(name.clone(), pair[1].clone()),
                _ => Param::Other(node.clone()),
            },
            other => Param::Other(other.clone()),
        }
    }

    /// The name this parameter binds, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Param::Name(name) | Param::WithDefault(name, _) => Some(name),
            Param::PositionalOnlyMarker | Param::Other(_) => None,
        }
    }

    fn to_node(&self) -> Node {
        match self {
            Param::Name(name) => Node::sym(name.as_str()),
            Param::WithDefault(name, default) => {
                Node::list(vec![Node::sym(name.as_str()), default.clone()])
            }
            Param::PositionalOnlyMarker => Node::sym("/"),
            Param::Other(node) => node.clone(),
        }
    }
}

impl ParamList {
    /// Parses the elements of a bracketed parameter list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use symwalk::scope::params::{ParamList, RestCapture};
    /// use symwalk::syntax::parse_one;
    ///
    /// let node = parse_one("[a [b 1] #* rest c #** kw]").unwrap();
    /// let params = ParamList::parse(node.elements().unwrap());
    /// assert_eq!(params.positional.len(), 2);
    /// assert_eq!(params.rest, Some(RestCapture::Named("rest".into())));
    /// assert_eq!(params.keyword_only.len(), 1);
    /// assert_eq!(params.mapping_rest.as_deref(), Some("kw"));
    /// ```
    pub fn parse(items: &[Node]) -> ParamList {
        let mut params = ParamList::default();
        let mut keyword_section = false;
        for item in items {
            if item.as_symbol() == Some("*") {
                params.rest = Some(RestCapture::Bare);
                keyword_section = true;
                continue;
            }
            if let Some(name) = unpack_target(item, "unpack-iterable") {
                params.rest = Some(RestCapture::Named(name.to_string()));
                keyword_section = true;
                continue;
            }
            if let Some(name) = unpack_target(item, "unpack-mapping") {
                params.mapping_rest = Some(name.to_string());
                continue;
            }
            let param = Param::parse(item);
            if keyword_section {
                params.keyword_only.push(param);
            } else {
                params.positional.push(param);
            }
        }
        params
    }

    pub fn to_node(&self) -> Node {
        let mut items: Vec<Node> = self.positional.iter().map(Param::to_node).collect();
        match &self.rest {
            Some(RestCapture::Bare) => items.push(Node::sym("*")),
            Some(RestCapture::Named(name)) => {
                items.push(Node::call("unpack-iterable", [Node::sym(name.as_str())]))
            }
            None => {}
        }
        items.extend(self.keyword_only.iter().map(Param::to_node));
        if let Some(name) = &self.mapping_rest {
            items.push(Node::call("unpack-mapping", [Node::sym(name.as_str())]));
        }
        Node::list(items)
    }
}

fn unpack_target<'a>(node: &'a Node, head: &str) -> Option<&'a str> {
    match node.as_expression()? {
        [op, target] if op.as_symbol() == Some(head) => target.as_symbol(),
        _ => None,
    }
}

// ============================================================================
// FORM RULES
// ============================================================================

impl Substituter<'_> {
    /// Substitutes default values left to right, protecting each name from the
    /// parameter after it on. Returns the rewritten list and the body's region.
    fn expand_params(
        &self,
        params: &ParamList,
        region: &Protected,
    ) -> Result<(ParamList, Protected), SymwalkError> {
        let mut inner = region.clone();
        let mut out = ParamList {
            rest: params.rest.clone(),
            mapping_rest: params.mapping_rest.clone(),
            ..ParamList::default()
        };
        out.positional = self.expand_section(&params.positional, &mut inner)?;
        if let Some(RestCapture::Named(name)) = &params.rest {
            inner.insert(name.clone());
        }
        out.keyword_only = self.expand_section(&params.keyword_only, &mut inner)?;
        if let Some(name) = &params.mapping_rest {
            inner.insert(name.clone());
        }
        Ok((out, inner))
    }

    fn expand_section(
        &self,
        section: &[Param],
        inner: &mut Protected,
    ) -> Result<Vec<Param>, SymwalkError> {
        let mut out = Vec::with_capacity(section.len());
        for param in section {
            let rewritten = match param {
                Param::WithDefault(name, default) => {
                    Param::WithDefault(name.clone(), self.expand(default, &mut inner.clone(), 0)?)
                }
                Param::Other(node) => Param::Other(self.expand(node, &mut inner.clone(), 0)?),
                other => other.clone(),
            };
            if let Some(name) = param.name() {
                inner.insert(name.to_string());
            }
            out.push(rewritten);
        }
        Ok(out)
    }

    /// Rewrites `[params] body...` starting at `items[at]`, appending to `out`.
    fn expand_signature(
        &self,
        items: &[Node],
        at: usize,
        mut out: Vec<Node>,
        region: &mut Protected,
    ) -> Result<Node, SymwalkError> {
        let Some(param_items) = items.get(at).and_then(|n| n.as_sequence(SeqKind::List)) else {
            out.extend(self.traverse(&items[at.min(items.len())..], region, 0)?);
            return Ok(Node::Expression(out));
        };
        let (params, mut inner) = self.expand_params(&ParamList::parse(param_items), region)?;
        out.push(params.to_node());
        out.extend(self.traverse(&items[at + 1..], &mut inner, 0)?);
        Ok(Node::Expression(out))
    }
}

/// `(fn [:async] [params] body...)`
pub(super) fn expand_fn(
    sub: &Substituter<'_>,
    items: &[Node],
    region: &mut Protected,
) -> Result<Node, SymwalkError> {
    let mut out = vec![items[0].clone()];
    let mut at = 1;
    if let Some(marker) = items.get(at).filter(|n| n.as_keyword() == Some("async")) {
        out.push(marker.clone());
        at += 1;
    }
    sub.expand_signature(items, at, out, region)
}

/// `(defn [:async] [[decorators]] name [params] body...)`
pub(super) fn expand_defn(
    sub: &Substituter<'_>,
    items: &[Node],
    region: &mut Protected,
) -> Result<Node, SymwalkError> {
    let mut out = vec![items[0].clone()];
    let mut at = 1;
    while let Some(item) = items.get(at) {
        match item {
            Node::Atom(_) if item.as_keyword().is_some() => out.push(item.clone()),
            Node::Sequence(SeqKind::List, _) => out.push(sub.expand(item, region, 0)?),
            _ => break,
        }
        at += 1;
    }
    if let Some(name) = items.get(at) {
        out.push(name.clone());
        at += 1;
    }
    sub.expand_signature(items, at, out, region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::substitute;
    use crate::syntax::parse_one;

    fn upcase(source: &str) -> String {
        let tree = parse_one(source).unwrap();
        let replace = |name: &str| {
            (name.len() == 1 && name.chars().all(|c| c.is_ascii_lowercase()))
                .then(|| Node::sym(name.to_uppercase()))
        };
        substitute(&tree, &replace, &Protected::new(), 0)
            .unwrap()
            .to_string()
    }

    #[test]
    fn parameters_are_protected_in_the_body() {
        assert_eq!(upcase("(fn [a b] (f a b c))"), "(fn [a b] (F a b C))");
    }

    #[test]
    fn defaults_see_only_earlier_parameters() {
        assert_eq!(upcase("(fn [[a b] [b a]] b)"), "(fn [[a B] [b a]] b)");
    }

    #[test]
    fn every_section_binds() {
        assert_eq!(
            upcase("(fn [a / b #* r [k z] #** m] (f a b r k m z))"),
            "(fn [a / b (unpack-iterable r) [k Z] (unpack-mapping m)] (F a b r k m Z))"
        );
        assert_eq!(upcase("(fn [* k] (f k q))"), "(fn [* k] (F k Q))");
    }

    #[test]
    fn async_marker_passes_through() {
        assert_eq!(upcase("(fn :async [a] (await a q))"), "(fn :async [a] (await a Q))");
    }

    #[test]
    fn defn_keeps_name_and_substitutes_decorators() {
        assert_eq!(upcase("(defn [d] f [a] (g a f))"), "(defn [D] f [a] (G a F))");
        assert_eq!(upcase("(defn :async f [] f)"), "(defn :async f [] F)");
    }

    #[test]
    fn missing_parameter_list_traverses_the_rest() {
        assert_eq!(upcase("(fn x)"), "(fn X)");
        assert_eq!(upcase("(defn f)"), "(defn f)");
    }

    #[test]
    fn parses_sections_in_order() {
        let node = parse_one("[a [b 1] * c #** kw]").unwrap();
        let params = ParamList::parse(node.elements().unwrap());
        assert_eq!(params.rest, Some(RestCapture::Bare));
        assert_eq!(params.keyword_only, vec![Param::Name("c".into())]);
        assert_eq!(params.mapping_rest.as_deref(), Some("kw"));
        assert_eq!(params.to_node(), node);
    }
}
