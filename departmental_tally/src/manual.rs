/*!

This is the long-form manual for `departmental_tally` and `escrutinio`.

## Input formats

The following formats are supported:
* `v2020` the JSON summary published by the Corte Electoral for the 2020 departmental
  elections (and the files that follow the same layout, such as 2015).

### `v2020`

A JSON array with one object per department. The first object is used to recognize the
format: it must carry the keys `DN`, `Departamentales` and `Municipales`, and the blank,
annulled and valid vote counters (`TA` or `VB`, `TO` or `VA`, `TH` or `TOT`).

Numbers may be written as JSON numbers or as strings. Anything else, including a missing
field, is read as zero. Percentages such as `CP` are kept as decimal strings and
normalized with a dot separator.

## Processing

The pipeline has four stages, each producing a new value:

1. **Validation** The tally tree checks that every declared total matches the sum of its
   parts (lists, sub-lemas, ballot sheets, parties). A declared total of zero is
   considered absent and is not checked. A sum too large for a vote counter is always a
   mismatch. The first mismatch stops the run with the path of the offending node.
2. **Cleaning** Names are normalized: territories and sub-lemas are reduced to upper case
   without accents or punctuation, parties are replaced by their official label from the
   alias table (or title-cased when the table does not know them), and candidate labels
   are folded while keeping the separators between candidates.
3. **Enrichment** Every department and municipality receives its winning lema, the seats
   of its council, the seats of every list, and the name of its mayor or intendant.
4. **Aggregation** The national statistics: votes and percentages per lema, territories
   won, seats won, and the most voted lema.

## Seat apportionment

Councils are apportioned with the D'Hondt method: each seat goes to the largest quotient
`votes / (seats won + 1)`.

Article 272 of the Constitution guarantees a majority to the most voted lema: 16 of the 31
seats of a Junta Departamental, 3 of the 5 seats of a Concejo Municipal. When the plain
D'Hondt distribution gives the winner fewer seats, the winner receives exactly the
majority and the other seats are apportioned between the other lemas only.

The seats of a lema are then split between its lists with plain D'Hondt.

In a Concejo Municipal, lemas without votes take no part in the apportionment. A
municipality where no lema has votes yet (a partial count) has no winner, no seats and no
mayor.

Equal quotients are resolved in favor of the entity with more votes, and then in favor of
the entity that appears first in the input. The same input order decides between lemas
with the same number of votes.

## Party aliases

The alias table is a JSON object from a known spelling to the official label:

```json
{
  "FA": "Frente Amplio",
  "PARTIDO CABILDO ABIERTO": "Cabildo Abierto"
}
```

Keys are compared after normalization, so `"F.A."` and `"fa"` both match the key `"FA"`.
A missing file is not an error: the table is then empty.

## Configuration

The `escrutinio` binary accepts either command-line flags or a JSON configuration file:

```json
{
  "outputSettings": {
    "electionName": "Departamentales 2020",
    "outputPath": "summary_2020.json"
  },
  "partyAliasesPath": "party_aliases.json",
  "sources": [
    {
      "provider": "v2020",
      "filePath": "results_2020.json",
      "year": 2020
    }
  ],
  "rules": {
    "departmentSeats": 31,
    "departmentMajority": 16,
    "municipalitySeats": 5,
    "municipalityMajority": 3,
    "percentageDecimals": 2
  }
}
```

Relative paths are resolved from the directory of the configuration file.

*/
