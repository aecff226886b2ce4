/*!
# Using the Terminal

Run the `basic` executable from a terminal. It answers with `Ok` and
waits for a line. A line that starts with a number is tokenised and
stored in the program; entering a number alone deletes that line.

<pre><code>&nbsp;  Ok
&nbsp;> 20 print "world"
&nbsp;> 10 ?"hello ";
&nbsp;> list
&nbsp;  10 PRINT"hello ";
&nbsp;  20 PRINT "world"
&nbsp;  Ok
</code></pre>

Nothing is executed. The terminal edits and converts programs:

* `LIST [from][-[to]]` shows stored lines in their canonical form.
  Typing a line number and pressing TAB completes it to that line.
* `DELETE from[-to]` removes lines. Deleting a range with no lines in it
  is an `ILLEGAL FUNCTION CALL`.
* `RENUM [new][,[start][,step]]` renumbers from `start` on and fixes every
  `GOTO`, `GOSUB` and other jump that refers to a renumbered line.
* `NEW` erases the program.
* `LOAD "file"` reads a program in any of the three file formats and
  `MERGE "file"` adds the lines of a plain text program.
* `SAVE "file"` writes the tokenised format, `SAVE "file",A` plain text
  and `SAVE "file",P` the protected format.
* `SYSTEM` or CTRL-D leaves. CTRL-C stops a long listing.

Environment variables change how programs are handled:

| Variable | Effect |
|----------|--------|
| `BASIC_SYNTAX` | `gwbasic`, `pcjr` or `tandy` keyword set |
| `BASIC_ALLOW_PROTECT` | keep protected programs protected after `LOAD` |
| `BASIC_HIDE_LISTING` | highest line number `LIST` and `SAVE ,A` show |
| `RUST_LOG` | log filter, `warn` unless set |

*/
