//! Reader for parametric max-flow instances in DIMACS format.
//!
//! ```text
//! c comment
//! p max <vertices> <arcs>
//! n <vertex> s
//! n <vertex> t
//! a <tail> <head> <capacity> [<slope>]
//! ```
//!
//! Vertex ids are 1-based. An arc without a slope has a constant capacity.

use alloc::vec::Vec;
use core::str::FromStr;

use itertools::Itertools;

use crate::error::Error;
use crate::id::VertexId;
use crate::instance::{Instance, RawArc};

const PROBLEM: &str = "expected `p max <vertices> <arcs>`";
const TERMINAL: &str = "expected `n <vertex> s` or `n <vertex> t`";
const ARC: &str = "expected `a <tail> <head> <capacity> [<slope>]`";

fn field<T: FromStr>(token: &str, line: usize, message: &'static str) -> Result<T, Error> {
    token.parse().map_err(|_| Error::Parse { line, message })
}

fn vertex(token: &str, line: usize, vertex_count: usize) -> Result<VertexId, Error> {
    let id: usize = field(token, line, "vertex id is not a number")?;
    if id == 0 || id > vertex_count {
        return Err(Error::Parse {
            line,
            message: "vertex id out of range",
        });
    }
    Ok(id - 1)
}

/// Parses `text` into an instance whose capacities at or above `infinity` are unbounded.
pub fn parse(text: &str, infinity: f64) -> Result<Instance, Error> {
    let mut problem: Option<(usize, usize)> = None;
    let mut source = None;
    let mut sink = None;
    let mut arcs = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let mut tokens = raw.split_whitespace();
        let kind = match tokens.next() {
            None | Some("c") => continue,
            Some(kind) => kind,
        };
        if kind != "p" && problem.is_none() {
            return Err(Error::Parse {
                line,
                message: "problem line must come first",
            });
        }

        match kind {
            "p" => {
                if problem.is_some() {
                    return Err(Error::Parse {
                        line,
                        message: "duplicate problem line",
                    });
                }
                let (_, n, m) = tokens
                    .collect_tuple()
                    .filter(|(format, _, _)| *format == "max")
                    .ok_or(Error::Parse {
                        line,
                        message: PROBLEM,
                    })?;
                problem = Some((field(n, line, PROBLEM)?, field(m, line, PROBLEM)?));
            }
            "n" => {
                let vertex_count = problem.map_or(0, |(n, _)| n);
                let (id, role) = tokens.collect_tuple().ok_or(Error::Parse {
                    line,
                    message: TERMINAL,
                })?;
                let id = vertex(id, line, vertex_count)?;
                match role {
                    "s" => source = Some(id),
                    "t" => sink = Some(id),
                    _ => {
                        return Err(Error::Parse {
                            line,
                            message: TERMINAL,
                        })
                    }
                }
            }
            "a" => {
                let vertex_count = problem.map_or(0, |(n, _)| n);
                let fields: Vec<_> = tokens.collect();
                let (tail, head, capacity, slope) = match fields.as_slice() {
                    [tail, head, capacity] => (tail, head, capacity, None),
                    [tail, head, capacity, slope] => (tail, head, capacity, Some(slope)),
                    _ => {
                        return Err(Error::Parse {
                            line,
                            message: ARC,
                        })
                    }
                };
                arcs.push(RawArc {
                    tail: vertex(tail, line, vertex_count)?,
                    head: vertex(head, line, vertex_count)?,
                    capacity: field(capacity, line, ARC)?,
                    slope: slope.map_or(Ok(0.0), |slope| field(slope, line, ARC))?,
                });
            }
            _ => {
                return Err(Error::Parse {
                    line,
                    message: "unknown line type",
                })
            }
        }
    }

    let last = text.lines().count();
    let (vertex_count, arc_count) = problem.ok_or(Error::Parse {
        line: last,
        message: "missing problem line",
    })?;
    if arcs.len() != arc_count {
        log::warn!(
            "problem line announces {} arcs but {} were read",
            arc_count,
            arcs.len()
        );
    }

    Ok(Instance {
        vertex_count,
        source: source.ok_or(Error::Parse {
            line: last,
            message: "missing source",
        })?,
        sink: sink.ok_or(Error::Parse {
            line: last,
            message: "missing sink",
        })?,
        arcs,
        infinity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::DEFAULT_INFINITY;

    const SCENARIO: &str = "c four vertices, one parametric arc
p max 4 4
n 1 s
n 4 t
a 1 2 0 1
a 2 4 5
a 1 3 3
a 3 4 3
";

    #[test]
    fn parses_terminals_and_arcs() {
        let instance = parse(SCENARIO, DEFAULT_INFINITY).unwrap();
        assert_eq!(instance.vertex_count, 4);
        assert_eq!((instance.source, instance.sink), (0, 3));
        assert_eq!(instance.arcs.len(), 4);
        assert_eq!(
            instance.arcs[0],
            RawArc {
                tail: 0,
                head: 1,
                capacity: 0.0,
                slope: 1.0
            }
        );
        assert_eq!(instance.arcs[1].slope, 0.0);
    }

    #[test]
    fn errors_carry_the_line_number() {
        assert_eq!(
            parse("p max 2 1\nn 1 s\nn 2 t\na 1 3 4\n", 100.0),
            Err(Error::Parse {
                line: 4,
                message: "vertex id out of range"
            })
        );
        assert_eq!(
            parse("p max 2 1\nn 1 s\nn 2 t\na 1 2\n", 100.0),
            Err(Error::Parse { line: 4, message: ARC })
        );
        assert_eq!(
            parse("c only\na 1 2 3\n", 100.0),
            Err(Error::Parse {
                line: 2,
                message: "problem line must come first"
            })
        );
        assert_eq!(
            parse("p max 2 1\nn 1 s\na 1 2 3\n", 100.0),
            Err(Error::Parse {
                line: 3,
                message: "missing sink"
            })
        );
        assert_eq!(
            parse("p min 2 1\n", 100.0),
            Err(Error::Parse {
                line: 1,
                message: PROBLEM
            })
        );
    }
}
