//! Small path-expression engine over an `xmltree` element tree.
//!
//! Supported syntax is the subset save files need:
//! - `.//name` / `//name`: any descendant named `name`
//! - `name`, `./name`, `a/b`: child steps
//! - `*` matches any element name
//! - one predicate per step: `[@attr='value']`, `[@attr="value"]` or the
//!   shorthand `[attr=value]`
//!
//! Nodes are addressed by [`NodePath`], the list of child indices from the
//! root element. Lexicographic order of paths is document order, which is how
//! "first match" is defined.
use std::ops::ControlFlow;

use xmltree::{Element, XMLNode};

use crate::error::{Result, SavError};

/// Child indices (into `Element::children`) leading from the root element to a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        NodePath(Vec::new())
    }
    pub fn child(&self, idx: usize) -> Self {
        let mut v = self.0.clone();
        v.push(idx);
        NodePath(v)
    }
    /// Parent path and this node's index within the parent's children.
    pub fn split_last(&self) -> Option<(NodePath, usize)> {
        let (last, rest) = self.0.split_last()?;
        Some((NodePath(rest.to_vec()), *last))
    }
    pub fn resolve<'e>(&self, root: &'e Element) -> Option<&'e Element> {
        let mut cur = root;
        for &i in &self.0 {
            cur = cur.children.get(i)?.as_element()?;
        }
        Some(cur)
    }
    pub fn resolve_mut<'e>(&self, root: &'e mut Element) -> Option<&'e mut Element> {
        let mut cur = root;
        for &i in &self.0 {
            cur = cur.children.get_mut(i)?.as_mut_element()?;
        }
        Some(cur)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    name: Option<String>,
    predicate: Option<(String, String)>,
}

impl Step {
    fn matches(&self, el: &Element) -> bool {
        if let Some(n) = &self.name
            && el.name != *n
        {
            return false;
        }
        match &self.predicate {
            Some((attr, val)) => el.attributes.get(attr).map(|v| v == val).unwrap_or(false),
            None => true,
        }
    }
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    steps: Vec<Step>,
}

impl PathExpr {
    pub fn parse(expr: &str) -> Result<PathExpr> {
        let bad = |why: &str| SavError::InvalidPath(format!("{}: {}", expr, why));
        let mut rest = expr.trim();
        let mut axis = Axis::Child;
        if let Some(r) = rest.strip_prefix(".//") {
            rest = r;
            axis = Axis::Descendant;
        } else if let Some(r) = rest.strip_prefix("//") {
            rest = r;
            axis = Axis::Descendant;
        } else if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
        }
        if rest.is_empty() {
            return Err(bad("empty"));
        }

        let mut steps = Vec::new();
        for seg in split_steps(rest).map_err(|e| bad(&e))? {
            if seg.is_empty() {
                // `a//b`
                if axis == Axis::Descendant {
                    return Err(bad("unexpected '/'"));
                }
                axis = Axis::Descendant;
                continue;
            }
            steps.push(parse_step(seg, axis).map_err(|e| bad(&e))?);
            axis = Axis::Child;
        }
        if axis == Axis::Descendant || steps.is_empty() {
            return Err(bad("trailing '/'"));
        }
        Ok(PathExpr { steps })
    }

    /// All matches in document order. With `context == None` the expression is
    /// evaluated from the document node, so the root element itself can match.
    pub fn select_all(&self, root: &Element, context: Option<&NodePath>) -> Vec<NodePath> {
        let mut current: Vec<NodePath> = Vec::new();
        let mut first = true;
        for step in &self.steps {
            let mut next = Vec::new();
            if first {
                match context {
                    None => match step.axis {
                        Axis::Child => {
                            if step.matches(root) {
                                next.push(NodePath::root());
                            }
                        }
                        Axis::Descendant => {
                            if step.matches(root) {
                                next.push(NodePath::root());
                            }
                            collect_descendants(root, &NodePath::root(), step, &mut next);
                        }
                    },
                    Some(ctx) => {
                        if let Some(el) = ctx.resolve(root) {
                            expand(el, ctx, step, &mut next);
                        }
                    }
                }
                first = false;
            } else {
                for p in &current {
                    if let Some(el) = p.resolve(root) {
                        expand(el, p, step, &mut next);
                    }
                }
            }
            next.sort();
            next.dedup();
            current = next;
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// First match in document order, same result as `select_all(..).first()`.
    ///
    /// Candidates are visited in document order and the walk stops once a
    /// candidate lies after the best match so far, since every match below a
    /// candidate follows it.
    pub fn select_first(&self, root: &Element, context: Option<&NodePath>) -> Option<NodePath> {
        let (step, rest) = self.steps.split_first()?;
        let mut best = None;
        let mut consider = |el: &Element, at: NodePath| pick(&mut best, el, at, rest);
        match context {
            None => {
                if step.matches(root) {
                    let _ = consider(root, NodePath::root());
                }
                if step.axis == Axis::Descendant {
                    let _ = walk(root, &mut Vec::new(), step, &mut consider);
                }
            }
            Some(ctx) => {
                let el = ctx.resolve(root)?;
                let _ = walk(el, &mut ctx.0.clone(), step, &mut consider);
            }
        }
        best
    }
}

fn pick(best: &mut Option<NodePath>, el: &Element, at: NodePath, rest: &[Step]) -> ControlFlow<()> {
    if best.as_ref().is_some_and(|b| at > *b) {
        return ControlFlow::Break(());
    }
    if let Some(found) = first_below(el, at, rest)
        && best.as_ref().is_none_or(|b| found < *b)
    {
        *best = Some(found);
    }
    ControlFlow::Continue(())
}

fn first_below(el: &Element, at: NodePath, steps: &[Step]) -> Option<NodePath> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(at);
    };
    let mut best = None;
    let _ = walk(el, &mut at.0.clone(), step, &mut |e: &Element, p: NodePath| pick(&mut best, e, p, rest));
    best
}

// Preorder walk over the candidates of `step` below `el`; `path` is the
// address of `el` and is restored on return.
fn walk<F>(el: &Element, path: &mut Vec<usize>, step: &Step, f: &mut F) -> ControlFlow<()>
where
    F: FnMut(&Element, NodePath) -> ControlFlow<()>,
{
    for (i, c) in el.children.iter().enumerate() {
        let XMLNode::Element(ce) = c else {
            continue;
        };
        path.push(i);
        let mut flow = ControlFlow::Continue(());
        if step.matches(ce) {
            flow = f(ce, NodePath(path.clone()));
        }
        if flow.is_continue() && step.axis == Axis::Descendant {
            flow = walk(ce, path, step, &mut *f);
        }
        path.pop();
        if flow.is_break() {
            return flow;
        }
    }
    ControlFlow::Continue(())
}

fn expand(el: &Element, at: &NodePath, step: &Step, out: &mut Vec<NodePath>) {
    match step.axis {
        Axis::Child => {
            for (i, c) in el.children.iter().enumerate() {
                if let XMLNode::Element(ce) = c
                    && step.matches(ce)
                {
                    out.push(at.child(i));
                }
            }
        }
        Axis::Descendant => collect_descendants(el, at, step, out),
    }
}

fn collect_descendants(el: &Element, at: &NodePath, step: &Step, out: &mut Vec<NodePath>) {
    for (i, c) in el.children.iter().enumerate() {
        if let XMLNode::Element(ce) = c {
            let p = at.child(i);
            if step.matches(ce) {
                out.push(p.clone());
            }
            collect_descendants(ce, &p, step, out);
        }
    }
}

// Split on '/' outside of brackets and quotes.
fn split_steps(s: &str) -> std::result::Result<Vec<&str>, String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1).ok_or("unbalanced ']'")?,
            (None, '/') if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err("unterminated quote".into());
    }
    if depth != 0 {
        return Err("unbalanced '['".into());
    }
    out.push(&s[start..]);
    Ok(out)
}

fn parse_step(seg: &str, axis: Axis) -> std::result::Result<Step, String> {
    let (name, predicate) = match seg.find('[') {
        Some(open) => {
            let body = seg[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| format!("bad predicate in '{}'", seg))?;
            if has_bracket_outside_quotes(body) {
                return Err(format!("only one predicate per step in '{}'", seg));
            }
            (&seg[..open], Some(parse_predicate(body)?))
        }
        None => (seg, None),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing element name in '{}'", seg));
    }
    Ok(Step {
        axis,
        name: if name == "*" { None } else { Some(name.to_string()) },
        predicate,
    })
}

fn parse_predicate(body: &str) -> std::result::Result<(String, String), String> {
    let (attr, val) = body
        .split_once('=')
        .ok_or_else(|| format!("unsupported predicate '{}'", body))?;
    let attr = attr.trim();
    let attr = attr.strip_prefix('@').unwrap_or(attr);
    if attr.is_empty() {
        return Err(format!("missing attribute in '{}'", body));
    }
    let val = val.trim();
    let val = val
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| val.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
        .unwrap_or(val);
    Ok((attr.to_string(), val.to_string()))
}

fn has_bracket_outside_quotes(s: &str) -> bool {
    let mut quote: Option<char> = None;
    for ch in s.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[' | ']') => return true,
            _ => {}
        }
    }
    false
}
