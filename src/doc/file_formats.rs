/*!
# Program Files

A GW-BASIC program is held in memory as a chain of tokenised lines. The
buffer starts with a NUL. Each line follows as a little-endian pointer
to the next line, a little-endian line number and the line's tokens,
and ends at the NUL that starts the next record. A pointer of `00 00`
ends the program.

```text
00 7b12 0a00 3a 8f d9 20 74 65 73 74    10 ' test
00 8812 1400 91 20 22 74 65 73 74 22    20 PRINT "test"
00 0000
```

Pointers hold the address the next line would have if the buffer was
loaded at `0x126D`. They are rewritten every time the program changes,
so a file is read correctly whatever pointers it carries.

## Formats

| First byte | Format | Contents |
|------------|--------|----------|
| `FF` | tokenised | the buffer without its leading NUL |
| `FE` | protected | the same, encrypted |
| other | plain text | one listed line per `CR LF` |

All three formats end with `1A`. Reading a plain text file stops at the
first `1A` and accepts a bare `LF` as line end.

## Protection

Protected files use the GW-BASIC cipher: each byte is offset and mixed
with a 13-byte and an 11-byte key, depending on its position modulo 13
and 11. A protected program cannot be listed, edited or saved in any
other format. Set `BASIC_ALLOW_PROTECT` to keep that restriction;
without it protected programs load as ordinary ones.

## Tokens

Keywords are one byte from `81` up, or two bytes behind the prefixes
`FD`, `FE` and `FF`. Numbers are stored as typed tokens:

| Token | Width | Value |
|-------|-------|-------|
| `11`-`1B` | 1 | the digits 0 to 10 |
| `0F` | 2 | integer 11 to 255 |
| `1C` | 3 | signed integer |
| `0B`, `0C` | 3 | octal or hex integer |
| `0E` | 3 | line number after a jump keyword |
| `1D` | 5 | single precision, Microsoft binary format |
| `1F` | 9 | double precision, Microsoft binary format |

*/
