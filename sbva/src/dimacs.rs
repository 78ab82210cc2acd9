/*****************************************************************************************[dimacs.rs]
Copyright (c) 2023-2024, Andrew Haberlandt, Harrison Green, Marijn J.H. Heule (SBVA)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

//! Streamed DIMACS CNF ingest.

use {
    crate::{clause::Lit, core::Formula},
    std::io::{self, BufRead},
};

/// `parse(input, f)` reads a DIMACS CNF from `input` into `f`.
///
/// `f` must be freshly built and not yet initialized; on success it is left
/// finished (dedup cache dropped, adjacency warmed) and ready for `run`.
/// Malformed input is a fatal `InvalidData` error: a clause line before the
/// `p cnf` header, a literal whose variable exceeds the header count, or
/// more clauses than the header announced.
pub fn parse<R: BufRead>(input: &mut R, f: &mut Formula) -> io::Result<()> {
    let mut lits = vec![];
    let mut expected_clauses = 0usize;
    let mut read_clauses = 0usize;
    let mut found_header = false;
    loop {
        skip_whitespace(input)?;
        let ch = next_byte(input)?;
        if ch == Some(b'p') {
            if found_header {
                return parse_error("PARSE ERROR! Duplicate header".into());
            }
            let mut header = [0; 5];
            input.read_exact(&mut header)?;
            if &header != b"p cnf" {
                return parse_error("PARSE ERROR! Unexpected char: p".into());
            }
            let num_vars = parse_int(input)?;
            let num_clauses = parse_int(input)?;
            if num_vars < 0 || num_clauses < 0 {
                return parse_error("PARSE ERROR! Negative header counts".into());
            }
            f.init_cnf(num_vars as u32);
            expected_clauses = num_clauses as usize;
            found_header = true;
        } else if ch == Some(b'c') {
            skip_line(input)?;
        } else if let Some(_) = ch {
            if !found_header {
                return parse_error("PARSE ERROR! CNF file does not have a header".into());
            }
            if read_clauses >= expected_clauses {
                return parse_error(
                    "PARSE ERROR! CNF file has more clauses than specified in header".into(),
                );
            }
            read_clause(input, f.num_vars(), &mut lits)?;
            f.admit_clause(&lits);
            read_clauses += 1;
        } else {
            break;
        }
    }
    if !found_header {
        // an empty (comment-only) file is an empty formula
        f.init_cnf(0);
    }
    f.finish_cnf();
    Ok(())
}

fn read_clause<R: BufRead>(input: &mut R, num_vars: u32, lits: &mut Vec<Lit>) -> io::Result<()> {
    lits.clear();
    loop {
        let parsed_lit = parse_int(input)?;
        if parsed_lit == 0 {
            return Ok(());
        }
        if parsed_lit.abs() as u32 > num_vars {
            return parse_error(
                "PARSE ERROR! Variable is greater than the number of variables specified in the header"
                    .into(),
            );
        }
        lits.push(Lit::from_dimacs(parsed_lit));
    }
}

fn parse_int<R: BufRead>(input: &mut R) -> io::Result<i32> {
    skip_whitespace(input)?;
    let ch = next_byte(input)?;
    let neg = if ch == Some(b'+') || ch == Some(b'-') {
        input.consume(1);
        ch == Some(b'-')
    } else {
        false
    };
    if let Some(ch) = next_byte(input)? {
        if !(b'0' <= ch && ch <= b'9') {
            return parse_error(format!("PARSE ERROR! Unexpected char: {}", ch as char));
        }
    } else {
        return parse_error("PARSE ERROR! Unexpected EOF".into());
    };
    let mut val = 0;
    while let Some(ch) = next_byte(input)? {
        if !(b'0' <= ch && ch <= b'9') {
            break;
        }
        input.consume(1);
        val = val * 10 + (ch - b'0') as i32;
    }
    if neg {
        Ok(-val)
    } else {
        Ok(val)
    }
}

#[inline(always)]
fn is_whitespace(ch: Option<u8>) -> bool {
    ch.map(|ch| b'\x09' <= ch && ch <= b'\x0d' || ch == b' ')
        .unwrap_or(false)
}

fn skip_whitespace<R: BufRead>(input: &mut R) -> io::Result<()> {
    while is_whitespace(next_byte(input)?) {
        input.consume(1);
    }
    Ok(())
}

fn skip_line<R: BufRead>(input: &mut R) -> io::Result<()> {
    loop {
        if let Some(ch) = next_byte(input)? {
            input.consume(1);
            if ch == b'\n' {
                return Ok(());
            }
        } else {
            return Ok(());
        }
    }
}

fn next_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    Ok(input.fill_buf()?.first().map(|&ch| ch))
}

fn parse_error<T>(message: String) -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::InvalidData, message))
}
